use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::StreamExt;
use sqlx::{FromRow, MySqlPool};

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus, CheckMethod};
use crate::model::settings::GeoPoint;
use crate::store::AttendanceStore;

/// MySQL-backed store. The `UNIQUE KEY (employee_id, date)` index is what
/// makes the first insert of a day atomic: a racing duplicate surfaces as
/// SQLSTATE 23000 and is mapped to `AlreadyCheckedIn`. Check-out relies on
/// a conditional UPDATE instead, so a stale writer simply affects zero rows.
///
/// See `schema.sql` for the table definition. Queries bind at runtime so the
/// crate builds without a reachable database.
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_key(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error("fetch attendance by day", e))?;
        row.map(AttendanceRow::into_record).transpose()
    }

    async fn fetch_by_id(
        &self,
        record_id: u64,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let sql = format!("SELECT {COLUMNS} FROM attendance WHERE id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_db_error("fetch attendance by id", e))?;
        row.map(AttendanceRow::into_record).transpose()
    }
}

const COLUMNS: &str = "id, employee_id, date, \
     check_in_at, check_in_lat, check_in_lng, check_in_accuracy_m, \
     check_in_address, check_in_photo, check_in_method, check_in_verified, \
     check_out_at, check_out_lat, check_out_lng, check_out_accuracy_m, \
     check_out_address, check_out_photo, check_out_method, check_out_verified, \
     status, notes, approved_by, created_at, updated_at";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in_at: Option<NaiveDateTime>,
    check_in_lat: Option<f64>,
    check_in_lng: Option<f64>,
    check_in_accuracy_m: Option<f64>,
    check_in_address: Option<String>,
    check_in_photo: Option<String>,
    check_in_method: Option<String>,
    check_in_verified: bool,
    check_out_at: Option<NaiveDateTime>,
    check_out_lat: Option<f64>,
    check_out_lng: Option<f64>,
    check_out_accuracy_m: Option<f64>,
    check_out_address: Option<String>,
    check_out_photo: Option<String>,
    check_out_method: Option<String>,
    check_out_verified: bool,
    status: String,
    notes: Option<String>,
    approved_by: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AttendanceRow {
    fn into_record(self) -> Result<AttendanceRecord, AttendanceError> {
        let status = self.status.parse::<AttendanceStatus>().map_err(|_| {
            AttendanceError::Storage(format!(
                "unknown status '{}' on record {}",
                self.status, self.id
            ))
        })?;

        let check_in = entry_from_columns(
            self.id,
            self.check_in_at,
            self.check_in_lat,
            self.check_in_lng,
            self.check_in_accuracy_m,
            self.check_in_address,
            self.check_in_photo,
            self.check_in_method,
            self.check_in_verified,
        )?;
        let check_out = entry_from_columns(
            self.id,
            self.check_out_at,
            self.check_out_lat,
            self.check_out_lng,
            self.check_out_accuracy_m,
            self.check_out_address,
            self.check_out_photo,
            self.check_out_method,
            self.check_out_verified,
        )?;

        let mut record = AttendanceRecord {
            id: self.id,
            employee_id: self.employee_id,
            date: self.date,
            check_in,
            check_out,
            total_hours: None,
            status,
            notes: self.notes,
            approved_by: self.approved_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        // Derived from the stamps on every read; the database carries no
        // total_hours column to drift out of sync.
        record.recompute_total_hours();
        Ok(record)
    }
}

#[allow(clippy::too_many_arguments)]
fn entry_from_columns(
    record_id: u64,
    at: Option<NaiveDateTime>,
    lat: Option<f64>,
    lng: Option<f64>,
    accuracy_meters: Option<f64>,
    address: Option<String>,
    photo: Option<String>,
    method: Option<String>,
    verified: bool,
) -> Result<Option<AttendanceEntry>, AttendanceError> {
    let Some(timestamp) = at else {
        return Ok(None);
    };
    let method = method
        .as_deref()
        .unwrap_or("manual")
        .parse::<CheckMethod>()
        .map_err(|_| {
            AttendanceError::Storage(format!("unknown check method on record {record_id}"))
        })?;
    let location = match (lat, lng) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };
    Ok(Some(AttendanceEntry {
        timestamp,
        location,
        accuracy_meters,
        address,
        photo,
        method,
        verified,
    }))
}

fn log_db_error(operation: &str, e: sqlx::Error) -> AttendanceError {
    tracing::error!(error = %e, operation, "attendance query failed");
    AttendanceError::from(e)
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        self.fetch_by_key(employee_id, date).await
    }

    async fn can_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError> {
        let row = sqlx::query_as::<_, (Option<NaiveDateTime>,)>(
            "SELECT check_in_at FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_db_error("check-in precondition", e))?;

        Ok(match row {
            None => true,
            Some((check_in_at,)) => check_in_at.is_none(),
        })
    }

    async fn can_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError> {
        let row = sqlx::query_as::<_, (Option<NaiveDateTime>, Option<NaiveDateTime>)>(
            "SELECT check_in_at, check_out_at FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_db_error("check-out precondition", e))?;

        Ok(matches!(row, Some((Some(_), None))))
    }

    async fn create_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: AttendanceEntry,
        status: AttendanceStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let insert = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in_at, check_in_lat, check_in_lng,
                 check_in_accuracy_m, check_in_address, check_in_photo,
                 check_in_method, check_in_verified, status, notes,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(entry.timestamp)
        .bind(entry.location.map(|p| p.latitude))
        .bind(entry.location.map(|p| p.longitude))
        .bind(entry.accuracy_meters)
        .bind(&entry.address)
        .bind(&entry.photo)
        .bind(entry.method.to_string())
        .bind(entry.verified)
        .bind(status.to_string())
        .bind(&notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {}
            Err(e) => {
                let duplicate_day = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000")
                );
                if !duplicate_day {
                    return Err(log_db_error("create check-in", e));
                }

                // The day row already exists; claim its check-in slot only
                // if it is still empty (a leave day filed by an external
                // flow has a row but no check-in).
                let result = sqlx::query(
                    r#"
                    UPDATE attendance
                    SET check_in_at = ?, check_in_lat = ?, check_in_lng = ?,
                        check_in_accuracy_m = ?, check_in_address = ?,
                        check_in_photo = ?, check_in_method = ?,
                        check_in_verified = ?, status = ?,
                        notes = COALESCE(?, notes), updated_at = ?
                    WHERE employee_id = ? AND date = ? AND check_in_at IS NULL
                    "#,
                )
                .bind(entry.timestamp)
                .bind(entry.location.map(|p| p.latitude))
                .bind(entry.location.map(|p| p.longitude))
                .bind(entry.accuracy_meters)
                .bind(&entry.address)
                .bind(&entry.photo)
                .bind(entry.method.to_string())
                .bind(entry.verified)
                .bind(status.to_string())
                .bind(&notes)
                .bind(now)
                .bind(employee_id)
                .bind(date)
                .execute(&self.pool)
                .await
                .map_err(|e| log_db_error("attach check-in", e))?;

                if result.rows_affected() == 0 {
                    return Err(AttendanceError::AlreadyCheckedIn);
                }
            }
        }

        self.fetch_by_key(employee_id, date).await?.ok_or_else(|| {
            AttendanceError::Storage(format!(
                "check-in committed but record vanished for employee {employee_id} on {date}"
            ))
        })
    }

    async fn apply_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: AttendanceEntry,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_at = ?, check_out_lat = ?, check_out_lng = ?,
                check_out_accuracy_m = ?, check_out_address = ?,
                check_out_photo = ?, check_out_method = ?,
                check_out_verified = ?, status = ?, updated_at = ?
            WHERE employee_id = ? AND date = ?
              AND check_in_at IS NOT NULL AND check_out_at IS NULL
            "#,
        )
        .bind(entry.timestamp)
        .bind(entry.location.map(|p| p.latitude))
        .bind(entry.location.map(|p| p.longitude))
        .bind(entry.accuracy_meters)
        .bind(&entry.address)
        .bind(&entry.photo)
        .bind(entry.method.to_string())
        .bind(entry.verified)
        .bind(status.to_string())
        .bind(now)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await
        .map_err(|e| log_db_error("apply check-out", e))?;

        if result.rows_affected() == 0 {
            return Err(AttendanceError::NotCheckedIn);
        }

        self.fetch_by_key(employee_id, date).await?.ok_or_else(|| {
            AttendanceError::Storage(format!(
                "check-out committed but record vanished for employee {employee_id} on {date}"
            ))
        })
    }

    async fn approve(
        &self,
        record_id: u64,
        approver_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        // Verification only ever moves 0 -> 1. An already-verified record
        // matches no row and falls through to the plain fetch below, which
        // makes the second approval a no-op.
        sqlx::query(
            r#"
            UPDATE attendance
            SET check_in_verified = IF(check_in_at IS NULL, check_in_verified, 1),
                check_out_verified = IF(check_out_at IS NULL, check_out_verified, 1),
                approved_by = ?, updated_at = ?
            WHERE id = ?
              AND ((check_in_at IS NOT NULL AND check_in_verified = 0)
                OR (check_out_at IS NOT NULL AND check_out_verified = 0))
            "#,
        )
        .bind(approver_id)
        .bind(now)
        .bind(record_id)
        .execute(&self.pool)
        .await
        .map_err(|e| log_db_error("approve attendance", e))?;

        self.fetch_by_id(record_id)
            .await?
            .ok_or(AttendanceError::RecordNotFound)
    }

    async fn list_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? \
             ORDER BY date ASC"
        );
        let mut stream = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch(&self.pool);

        let mut records = Vec::new();
        while let Some(row) = stream.next().await {
            let row = row.map_err(|e| log_db_error("list attendance range", e))?;
            records.push(row.into_record()?);
        }
        Ok(records)
    }
}
