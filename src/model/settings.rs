use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, ToSchema)]
#[schema(example = json!({ "latitude": 23.8103, "longitude": 90.4125 }))]
pub struct GeoPoint {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
}

/// Circular boundary around the workplace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

/// Organization-wide attendance configuration. Read-only to this service:
/// every operation takes one snapshot up front and never re-reads it
/// mid-flight. Mutation belongs to an external administrative flow.
#[derive(Debug, Clone)]
pub struct AttendanceSettings {
    /// Scheduled shift start, local wall clock.
    pub check_in_time: NaiveTime,
    /// Scheduled shift end, local wall clock.
    pub check_out_time: NaiveTime,
    /// Grace period after `check_in_time` before a check-in counts as late.
    pub late_threshold_minutes: i64,
    /// Minimum hours of presence for the day to count as a full day.
    pub half_day_threshold_hours: f64,
    pub working_days: Vec<Weekday>,
    pub holidays: Vec<NaiveDate>,
    pub location_required: bool,
    pub photo_required: bool,
    /// Maximum acceptable GPS accuracy radius for a verified fix.
    pub gps_accuracy_meters: f64,
    pub workplace: Geofence,
}

impl AttendanceSettings {
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.working_days.contains(&date.weekday()) && !self.holidays.contains(&date)
    }
}

/// Source of the current settings snapshot.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<AttendanceSettings>;
}

/// Snapshot holder seeded from config. An admin flow may swap the whole
/// snapshot at any time; in-flight operations keep the clone they took.
pub struct StaticSettingsSource {
    inner: RwLock<AttendanceSettings>,
}

impl StaticSettingsSource {
    pub fn new(settings: AttendanceSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub async fn replace(&self, settings: AttendanceSettings) {
        *self.inner.write().await = settings;
    }
}

#[async_trait]
impl SettingsSource for StaticSettingsSource {
    async fn snapshot(&self) -> anyhow::Result<AttendanceSettings> {
        Ok(self.inner.read().await.clone())
    }
}
