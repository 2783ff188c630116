pub mod geocode;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::AttendanceError;
use crate::model::settings::GeoPoint;

/// Upper bound on one hardware position round-trip.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// A raw position fix as the device reports it. Accuracy is optional on
/// purpose: a fix without one is treated as unverifiable downstream.
#[derive(Debug, Clone)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Boundary to the device positioning stack. The service never talks to
/// hardware directly; it sees only this interface.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn check_permission(&self) -> PermissionState;
    async fn request_permission(&self) -> PermissionState;
    async fn current_location(&self) -> Result<LocationFix, AttendanceError>;
}

/// Fixed-position provider for kiosk terminals mounted at the workplace.
pub struct StaticLocationProvider {
    fix: LocationFix,
}

impl StaticLocationProvider {
    pub fn new(fix: LocationFix) -> Self {
        Self { fix }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn check_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn current_location(&self) -> Result<LocationFix, AttendanceError> {
        Ok(self.fix.clone())
    }
}

/// For deployments where every client submits coordinates with the request
/// and the server itself has no position source.
pub struct NoLocationProvider;

#[async_trait]
impl LocationProvider for NoLocationProvider {
    async fn check_permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    async fn request_permission(&self) -> PermissionState {
        PermissionState::Denied
    }

    async fn current_location(&self) -> Result<LocationFix, AttendanceError> {
        Err(AttendanceError::LocationUnavailable)
    }
}
