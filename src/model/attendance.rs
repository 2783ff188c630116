use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::settings::GeoPoint;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    HalfDay,
    Absent,
    Leave,
}

/// How a check entry came to exist: `Automatic` means the fix passed the
/// geofence and accuracy gates, `Manual` means it needs human approval.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckMethod {
    Automatic,
    Manual,
}

/// One side of the day: either the check-in or the check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    /// Local wall-clock time the entry was taken.
    #[schema(example = "2026-01-05T09:02:41", value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    pub location: Option<GeoPoint>,
    #[schema(example = 12.5, nullable = true)]
    pub accuracy_meters: Option<f64>,
    /// Best-effort reverse-geocoded address; absent when geocoding failed.
    #[schema(example = "12 Gulshan Ave, Dhaka", nullable = true)]
    pub address: Option<String>,
    /// Opaque reference to an attached photo blob.
    #[schema(example = "blobs/2026/01/05/emp-1000-in.jpg", nullable = true)]
    pub photo: Option<String>,
    pub method: CheckMethod,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "date": "2026-01-05",
    "check_in": {
        "timestamp": "2026-01-05T09:02:41",
        "location": { "latitude": 23.8103, "longitude": 90.4125 },
        "accuracy_meters": 12.5,
        "address": "12 Gulshan Ave, Dhaka",
        "photo": null,
        "method": "automatic",
        "verified": true
    },
    "check_out": null,
    "total_hours": null,
    "status": "present",
    "notes": null,
    "approved_by": null,
    "created_at": "2026-01-05T03:02:41Z",
    "updated_at": "2026-01-05T03:02:41Z"
}))]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub check_in: Option<AttendanceEntry>,
    pub check_out: Option<AttendanceEntry>,
    /// Defined only when both stamps exist; always derived from them.
    #[schema(example = 8.25, nullable = true)]
    pub total_hours: Option<f64>,
    pub status: AttendanceStatus,
    #[schema(nullable = true)]
    pub notes: Option<String>,
    /// Employee id of the approver, once an approval happened.
    #[schema(example = 7, nullable = true)]
    pub approved_by: Option<u64>,
    #[schema(example = "2026-01-05T03:02:41Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-05T03:02:41Z", value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Re-derives `total_hours` from the two stamps. Called on every write
    /// that touches `check_out`; the field is never authoritative on its own.
    pub fn recompute_total_hours(&mut self) {
        self.total_hours = match (&self.check_in, &self.check_out) {
            (Some(ci), Some(co)) => {
                Some((co.timestamp - ci.timestamp).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        };
    }

    /// A fully closed day: both stamps present and both verified.
    pub fn is_closed(&self) -> bool {
        let verified =
            |e: &Option<AttendanceEntry>| e.as_ref().map(|e| e.verified).unwrap_or(false);
        verified(&self.check_in) && verified(&self.check_out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "total_days": 22,
    "present_days": 18,
    "absent_days": 1,
    "late_days": 2,
    "half_days": 1,
    "total_hours": 170.5,
    "average_hours_per_day": 8.1,
    "attendance_percentage": 95.45
}))]
pub struct AttendanceStats {
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub late_days: u32,
    pub half_days: u32,
    pub total_hours: f64,
    pub average_hours_per_day: f64,
    pub attendance_percentage: f64,
}

impl AttendanceStats {
    /// Folds a period's stored records into the aggregate. Nothing here is
    /// persisted; the stored records stay the single source of truth.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut stats = AttendanceStats {
            total_days: records.len() as u32,
            present_days: 0,
            absent_days: 0,
            late_days: 0,
            half_days: 0,
            total_hours: 0.0,
            average_hours_per_day: 0.0,
            attendance_percentage: 0.0,
        };

        let mut days_with_hours = 0u32;
        for record in records {
            match record.status {
                AttendanceStatus::Present => stats.present_days += 1,
                AttendanceStatus::Late => stats.late_days += 1,
                AttendanceStatus::HalfDay => stats.half_days += 1,
                AttendanceStatus::Absent => stats.absent_days += 1,
                AttendanceStatus::Leave => {}
            }
            if let Some(hours) = record.total_hours {
                stats.total_hours += hours;
                days_with_hours += 1;
            }
        }

        if days_with_hours > 0 {
            stats.average_hours_per_day = stats.total_hours / days_with_hours as f64;
        }
        if stats.total_days > 0 {
            let attended = stats.present_days + stats.late_days + stats.half_days;
            stats.attendance_percentage = attended as f64 / stats.total_days as f64 * 100.0;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(ts: &str) -> AttendanceEntry {
        AttendanceEntry {
            timestamp: ts.parse().unwrap(),
            location: None,
            accuracy_meters: None,
            address: None,
            photo: None,
            method: CheckMethod::Manual,
            verified: false,
        }
    }

    fn record(status: AttendanceStatus, hours: Option<f64>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 1000,
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            check_in: None,
            check_out: None,
            total_hours: hours,
            status,
            notes: None,
            approved_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn total_hours_follows_the_two_stamps() {
        let mut rec = record(AttendanceStatus::Present, None);
        rec.check_in = Some(entry("2026-01-05T09:00:00"));
        rec.recompute_total_hours();
        assert_eq!(rec.total_hours, None);

        rec.check_out = Some(entry("2026-01-05T17:30:00"));
        rec.recompute_total_hours();
        assert!((rec.total_hours.unwrap() - 8.5).abs() < 1e-9);
    }

    #[test]
    fn status_strings_round_trip_through_strum() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half_day");
        assert_eq!(
            "half_day".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::HalfDay
        );
        assert_eq!(CheckMethod::Automatic.to_string(), "automatic");
    }

    #[test]
    fn stats_fold_counts_and_percentage() {
        let records = vec![
            record(AttendanceStatus::Present, Some(8.0)),
            record(AttendanceStatus::Present, Some(9.0)),
            record(AttendanceStatus::Late, Some(7.0)),
            record(AttendanceStatus::HalfDay, Some(3.0)),
            record(AttendanceStatus::Absent, None),
        ];
        let stats = AttendanceStats::from_records(&records);
        assert_eq!(stats.total_days, 5);
        assert_eq!(stats.present_days, 2);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.half_days, 1);
        assert_eq!(stats.absent_days, 1);
        assert!((stats.total_hours - 27.0).abs() < 1e-9);
        assert!((stats.average_hours_per_day - 6.75).abs() < 1e-9);
        assert!((stats.attendance_percentage - 80.0).abs() < 1e-9);
    }

    #[test]
    fn stats_fold_handles_empty_period() {
        let stats = AttendanceStats::from_records(&[]);
        assert_eq!(stats.total_days, 0);
        assert_eq!(stats.attendance_percentage, 0.0);
        assert_eq!(stats.average_hours_per_day, 0.0);
    }
}
