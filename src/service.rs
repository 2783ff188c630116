use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::classifier;
use crate::clock::Clock;
use crate::error::AttendanceError;
use crate::geofence;
use crate::location::geocode::{self, ReverseGeocoder};
use crate::location::{LOCATION_TIMEOUT, LocationFix, LocationProvider, PermissionState};
use crate::model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceStats, CheckMethod,
};
use crate::model::settings::{AttendanceSettings, SettingsSource};
use crate::photo::PhotoCapture;
use crate::store::AttendanceStore;

/// Caller-supplied facts for one check-in or check-out attempt.
#[derive(Debug, Clone, Default)]
pub struct CheckData {
    pub location: Option<SubmittedLocation>,
    pub photo: Option<String>,
    pub notes: Option<String>,
}

/// Coordinates submitted by the client device alongside the request.
#[derive(Debug, Clone, Copy)]
pub struct SubmittedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Week,
    Month,
    Year,
}

/// Orchestrates geofence gating, classification and the record lifecycle.
/// Every collaborator is injected, so the whole flow runs deterministically
/// against fakes in tests.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    settings: Arc<dyn SettingsSource>,
    location: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    photos: Arc<dyn PhotoCapture>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        settings: Arc<dyn SettingsSource>,
        location: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        photos: Arc<dyn PhotoCapture>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            location,
            geocoder,
            photos,
            clock,
        }
    }

    pub async fn check_in(
        &self,
        employee_id: u64,
        data: CheckData,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let settings = self.snapshot().await?;
        let today = self.clock.now_local().date();

        // Cheap early probe; the authoritative check runs again inside the
        // store commit, under its lock.
        if !self.store.can_check_in(employee_id, today).await? {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        // Everything slow finishes before the commit: position fix,
        // reverse geocode, photo. Nothing below holds a record lock.
        let fix = self.resolve_fix(data.location, &settings).await?;
        let verified = validate_fix(fix.as_ref(), &settings)?;
        let entry = self.build_entry(fix, verified, data.photo, &settings).await;

        let status = classifier::classify(entry.timestamp, None, &settings);
        let record = self
            .store
            .create_check_in(
                employee_id,
                today,
                entry,
                status,
                data.notes,
                self.clock.now_utc(),
            )
            .await?;

        tracing::info!(employee_id, record_id = record.id, status = %record.status, "checked in");
        Ok(record)
    }

    pub async fn check_out(
        &self,
        employee_id: u64,
        data: CheckData,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let settings = self.snapshot().await?;
        let today = self.clock.now_local().date();

        let current = self
            .store
            .today_record(employee_id, today)
            .await?
            .ok_or(AttendanceError::NotCheckedIn)?;
        if current.check_out.is_some() {
            return Err(AttendanceError::NotCheckedIn);
        }
        let check_in_at = current
            .check_in
            .as_ref()
            .ok_or(AttendanceError::NotCheckedIn)?
            .timestamp;

        let fix = self.resolve_fix(data.location, &settings).await?;
        let verified = validate_fix(fix.as_ref(), &settings)?;
        let entry = self.build_entry(fix, verified, data.photo, &settings).await;

        // Recomputed with both stamps; a short day may now become half_day.
        let status = classifier::classify(check_in_at, Some(entry.timestamp), &settings);
        let record = self
            .store
            .apply_check_out(employee_id, today, entry, status, self.clock.now_utc())
            .await?;

        tracing::info!(
            employee_id,
            record_id = record.id,
            status = %record.status,
            total_hours = record.total_hours,
            "checked out"
        );
        Ok(record)
    }

    /// `can_approve` is the verdict of an external authorization policy;
    /// this service only enforces it plus the one-way verified transition.
    pub async fn approve(
        &self,
        record_id: u64,
        approver_id: u64,
        can_approve: bool,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if !can_approve {
            return Err(AttendanceError::Unauthorized);
        }
        let record = self
            .store
            .approve(record_id, approver_id, self.clock.now_utc())
            .await?;
        tracing::info!(record_id, approver_id, "attendance record approved");
        Ok(record)
    }

    pub async fn today_record(
        &self,
        employee_id: u64,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let today = self.clock.now_local().date();
        self.store.today_record(employee_id, today).await
    }

    pub async fn history(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        if start > end {
            return Err(AttendanceError::InvalidRange);
        }
        self.store.list_range(employee_id, start, end).await
    }

    /// Aggregates stored records over the period; nothing is persisted.
    pub async fn stats(
        &self,
        employee_id: u64,
        period: StatsPeriod,
    ) -> Result<AttendanceStats, AttendanceError> {
        let today = self.clock.now_local().date();
        let start = match period {
            StatsPeriod::Week => today - Duration::days(6),
            StatsPeriod::Month => today.with_day(1).unwrap_or(today),
            StatsPeriod::Year => {
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today)
            }
        };
        let records = self.store.list_range(employee_id, start, today).await?;
        Ok(AttendanceStats::from_records(&records))
    }

    async fn snapshot(&self) -> Result<AttendanceSettings, AttendanceError> {
        self.settings
            .snapshot()
            .await
            .map_err(|e| AttendanceError::Storage(format!("settings unavailable: {e:#}")))
    }

    /// Picks the fix for this attempt: a caller-submitted position wins;
    /// otherwise the device provider is asked, but only when configuration
    /// demands a location at all.
    async fn resolve_fix(
        &self,
        submitted: Option<SubmittedLocation>,
        settings: &AttendanceSettings,
    ) -> Result<Option<LocationFix>, AttendanceError> {
        if let Some(s) = submitted {
            return Ok(Some(LocationFix {
                latitude: s.latitude,
                longitude: s.longitude,
                accuracy_meters: s.accuracy_meters,
                timestamp: self.clock.now_utc(),
            }));
        }
        if !settings.location_required {
            return Ok(None);
        }

        let mut permission = self.location.check_permission().await;
        if permission != PermissionState::Granted {
            permission = self.location.request_permission().await;
        }
        if permission != PermissionState::Granted {
            return Err(AttendanceError::PermissionDenied);
        }

        match tokio::time::timeout(LOCATION_TIMEOUT, self.location.current_location()).await {
            Ok(Ok(fix)) => Ok(Some(fix)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AttendanceError::LocationUnavailable),
        }
    }

    /// Assembles the entry, running the best-effort steps (reverse geocode,
    /// photo capture). Their failure degrades the entry and nothing else.
    async fn build_entry(
        &self,
        fix: Option<LocationFix>,
        verified: bool,
        photo: Option<String>,
        settings: &AttendanceSettings,
    ) -> AttendanceEntry {
        let address = match &fix {
            Some(f) => geocode::resolve_address(self.geocoder.as_ref(), f.point()).await,
            None => None,
        };
        let photo = match photo {
            Some(reference) => Some(reference),
            None if settings.photo_required => self.photos.capture().await,
            None => None,
        };

        AttendanceEntry {
            timestamp: self.clock.now_local(),
            location: fix.as_ref().map(|f| f.point()),
            accuracy_meters: fix.as_ref().and_then(|f| f.accuracy_meters),
            address,
            photo,
            method: if verified {
                CheckMethod::Automatic
            } else {
                CheckMethod::Manual
            },
            verified,
        }
    }
}

/// Gates the fix against accuracy and the workplace fence. In required mode
/// a failure aborts the attempt; in optional mode it demotes the entry to
/// manual/unverified while keeping the raw coordinates for later review.
fn validate_fix(
    fix: Option<&LocationFix>,
    settings: &AttendanceSettings,
) -> Result<bool, AttendanceError> {
    let Some(fix) = fix else {
        return if settings.location_required {
            Err(AttendanceError::LocationUnavailable)
        } else {
            Ok(false)
        };
    };

    if !geofence::has_sufficient_accuracy(fix.accuracy_meters, settings.gps_accuracy_meters) {
        return if settings.location_required {
            Err(AttendanceError::LocationAccuracy)
        } else {
            Ok(false)
        };
    }

    if !geofence::is_within_geofence(
        fix.point(),
        settings.workplace.center,
        settings.workplace.radius_meters,
    ) {
        return if settings.location_required {
            Err(AttendanceError::OutOfRange)
        } else {
            Ok(false)
        };
    }

    Ok(true)
}
