use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus};
use crate::store::AttendanceStore;

/// In-memory record store. All mutation goes through one async mutex, so a
/// precondition check and its commit happen under a single lock acquisition:
/// two racing check-ins for the same (employee, date) cannot both pass.
/// The critical section is pure memory work; slow I/O (location, geocoding)
/// is finished by the service before it ever calls in here.
#[derive(Default)]
pub struct InMemoryAttendanceStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    records: HashMap<(u64, NaiveDate), AttendanceRecord>,
    keys_by_id: HashMap<u64, (u64, NaiveDate)>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendanceStore for InMemoryAttendanceStore {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let state = self.state.lock().await;
        Ok(state.records.get(&(employee_id, date)).cloned())
    }

    async fn can_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError> {
        let state = self.state.lock().await;
        Ok(match state.records.get(&(employee_id, date)) {
            None => true,
            Some(record) => record.check_in.is_none(),
        })
    }

    async fn can_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .get(&(employee_id, date))
            .map(|r| r.check_in.is_some() && r.check_out.is_none())
            .unwrap_or(false))
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
        let mut state = self.state.lock().await;

        if let Some(existing) = state.records.get_mut(&(employee_id, date)) {
            // A record without a check-in can exist (e.g. a leave day filed
            // by an external flow); attach the check-in to it.
            if existing.check_in.is_some() {
                return Err(AttendanceError::AlreadyCheckedIn);
            }
            existing.check_in = Some(entry);
            existing.status = status;
            if notes.is_some() {
                existing.notes = notes;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let id = state.next_id;
        let record = AttendanceRecord {
            id,
            employee_id,
            date,
            check_in: Some(entry),
            check_out: None,
            total_hours: None,
            status,
            notes,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        state.records.insert((employee_id, date), record.clone());
        state.keys_by_id.insert(id, (employee_id, date));
        Ok(record)
    }

    async fn apply_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: AttendanceEntry,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut state = self.state.lock().await;

        let record = state
            .records
            .get_mut(&(employee_id, date))
            .filter(|r| r.check_in.is_some() && r.check_out.is_none())
            .ok_or(AttendanceError::NotCheckedIn)?;

        record.check_out = Some(entry);
        record.status = status;
        record.recompute_total_hours();
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn approve(
        &self,
        record_id: u64,
        approver_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut state = self.state.lock().await;

        let key = *state
            .keys_by_id
            .get(&record_id)
            .ok_or(AttendanceError::RecordNotFound)?;
        let record = state
            .records
            .get_mut(&key)
            .ok_or(AttendanceError::RecordNotFound)?;

        let mut touched = false;
        if let Some(check_in) = record.check_in.as_mut() {
            if !check_in.verified {
                check_in.verified = true;
                touched = true;
            }
        }
        if let Some(check_out) = record.check_out.as_mut() {
            if !check_out.verified {
                check_out.verified = true;
                touched = true;
            }
        }

        if touched {
            record.approved_by = Some(approver_id);
            record.updated_at = now;
        }
        Ok(record.clone())
    }

    async fn list_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let state = self.state.lock().await;
        let mut records: Vec<AttendanceRecord> = state
            .records
            .values()
            .filter(|r| r.employee_id == employee_id && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::CheckMethod;
    use std::sync::Arc;

    fn entry(ts: &str, verified: bool) -> AttendanceEntry {
        AttendanceEntry {
            timestamp: ts.parse().unwrap(),
            location: None,
            accuracy_meters: None,
            address: None,
            photo: None,
            method: if verified {
                CheckMethod::Automatic
            } else {
                CheckMethod::Manual
            },
            verified,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[tokio::test]
    async fn check_in_then_out_lifecycle() {
        let store = InMemoryAttendanceStore::new();
        let now = Utc::now();

        assert!(store.can_check_in(1000, day(5)).await.unwrap());
        assert!(!store.can_check_out(1000, day(5)).await.unwrap());

        let record = store
            .create_check_in(
                1000,
                day(5),
                entry("2026-01-05T09:00:00", true),
                AttendanceStatus::Present,
                None,
                now,
            )
            .await
            .unwrap();
        assert_eq!(record.id, 1);
        assert!(!store.can_check_in(1000, day(5)).await.unwrap());
        assert!(store.can_check_out(1000, day(5)).await.unwrap());

        let record = store
            .apply_check_out(
                1000,
                day(5),
                entry("2026-01-05T17:00:00", true),
                AttendanceStatus::Present,
                now,
            )
            .await
            .unwrap();
        assert!((record.total_hours.unwrap() - 8.0).abs() < 1e-9);
        assert!(!store.can_check_out(1000, day(5)).await.unwrap());
    }

    #[tokio::test]
    async fn second_check_in_same_day_is_rejected() {
        let store = InMemoryAttendanceStore::new();
        let now = Utc::now();
        store
            .create_check_in(
                1000,
                day(5),
                entry("2026-01-05T09:00:00", true),
                AttendanceStatus::Present,
                None,
                now,
            )
            .await
            .unwrap();

        let err = store
            .create_check_in(
                1000,
                day(5),
                entry("2026-01-05T09:01:00", true),
                AttendanceStatus::Present,
                None,
                now,
            )
            .await
            .unwrap_err();
        assert_eq!(err, AttendanceError::AlreadyCheckedIn);

        // A different day is a fresh start.
        assert!(store.can_check_in(1000, day(6)).await.unwrap());
    }

    #[tokio::test]
    async fn check_out_without_check_in_is_rejected() {
        let store = InMemoryAttendanceStore::new();
        let err = store
            .apply_check_out(
                1000,
                day(5),
                entry("2026-01-05T17:00:00", true),
                AttendanceStatus::Present,
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, AttendanceError::NotCheckedIn);
    }

    #[tokio::test]
    async fn concurrent_check_ins_let_exactly_one_through() {
        let store = Arc::new(InMemoryAttendanceStore::new());
        let now = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_check_in(
                        1000,
                        day(5),
                        entry("2026-01-05T09:00:00", true),
                        AttendanceStatus::Present,
                        None,
                        now,
                    )
                    .await
            }));
        }

        let mut ok = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AttendanceError::AlreadyCheckedIn) => already += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!((ok, already), (1, 1));
    }

    #[tokio::test]
    async fn approve_is_one_way_and_idempotent() {
        let store = InMemoryAttendanceStore::new();
        let now = Utc::now();
        let record = store
            .create_check_in(
                1000,
                day(5),
                entry("2026-01-05T09:00:00", false),
                AttendanceStatus::Present,
                None,
                now,
            )
            .await
            .unwrap();
        assert!(!record.check_in.as_ref().unwrap().verified);

        let approved = store.approve(record.id, 7, now).await.unwrap();
        assert!(approved.check_in.as_ref().unwrap().verified);
        assert_eq!(approved.approved_by, Some(7));

        // Second approval changes nothing, including the audit stamp.
        let again = store.approve(record.id, 8, now).await.unwrap();
        assert_eq!(again.approved_by, Some(7));
        assert_eq!(again, approved);
    }

    #[tokio::test]
    async fn approve_unknown_record_is_not_found() {
        let store = InMemoryAttendanceStore::new();
        let err = store.approve(42, 7, Utc::now()).await.unwrap_err();
        assert_eq!(err, AttendanceError::RecordNotFound);
    }

    #[tokio::test]
    async fn list_range_is_scoped_and_sorted() {
        let store = InMemoryAttendanceStore::new();
        let now = Utc::now();
        for d in [7u32, 5, 6] {
            store
                .create_check_in(
                    1000,
                    day(d),
                    entry("2026-01-05T09:00:00", true),
                    AttendanceStatus::Present,
                    None,
                    now,
                )
                .await
                .unwrap();
        }
        // Another employee's day must not leak in.
        store
            .create_check_in(
                2000,
                day(6),
                entry("2026-01-06T09:00:00", true),
                AttendanceStatus::Present,
                None,
                now,
            )
            .await
            .unwrap();

        let records = store.list_range(1000, day(5), day(6)).await.unwrap();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(5), day(6)]);
        assert!(records.iter().all(|r| r.employee_id == 1000));
    }
}
