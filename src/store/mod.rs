pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus};

/// Owner of the per-employee-per-day records and their lifecycle rules.
/// Implementations must serialize check-in/check-out for the same
/// (employee_id, date) key: of two racing check-ins exactly one may win.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError>;

    /// No record for the day yet, or a record that has no check-in.
    async fn can_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError>;

    /// A check-in exists and no check-out does.
    async fn can_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<bool, AttendanceError>;

    /// Commits a check-in. `AlreadyCheckedIn` when the day already has one;
    /// the precondition is re-checked atomically inside the commit.
    async fn create_check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: AttendanceEntry,
        status: AttendanceStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Commits a check-out and re-derives `total_hours`. `NotCheckedIn`
    /// when there is nothing open to close.
    async fn apply_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        entry: AttendanceEntry,
        status: AttendanceStatus,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Marks the entries present on the record as verified. Verification is
    /// one-way; approving an already-verified record is a no-op, not an
    /// error. `RecordNotFound` for an unknown id.
    async fn approve(
        &self,
        record_id: u64,
        approver_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Records for one employee in [start, end], date ascending.
    async fn list_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError>;
}
