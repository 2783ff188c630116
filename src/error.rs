use actix_web::{HttpResponse, http::StatusCode};
use derive_more::Display;

/// Everything a check-in/check-out/approval attempt can fail with. Each
/// variant renders as one actionable client-facing message; backend detail
/// never leaks past `Storage`.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,
    #[display(fmt = "No active check-in found for today")]
    NotCheckedIn,
    #[display(fmt = "Location permission denied")]
    PermissionDenied,
    #[display(fmt = "Could not acquire your location, please try again")]
    LocationUnavailable,
    #[display(fmt = "GPS accuracy is too low to verify your location")]
    LocationAccuracy,
    #[display(fmt = "You must be at the workplace to check in or out")]
    OutOfRange,
    #[display(fmt = "Attendance record not found")]
    RecordNotFound,
    #[display(fmt = "You are not allowed to approve attendance records")]
    Unauthorized,
    #[display(fmt = "start_date cannot be after end_date")]
    InvalidRange,
    #[display(fmt = "Internal Server Error")]
    Storage(String),
}

impl std::error::Error for AttendanceError {}

impl actix_web::ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::AlreadyCheckedIn
            | AttendanceError::NotCheckedIn
            | AttendanceError::LocationAccuracy
            | AttendanceError::OutOfRange
            | AttendanceError::InvalidRange => StatusCode::BAD_REQUEST,
            AttendanceError::PermissionDenied | AttendanceError::Unauthorized => {
                StatusCode::FORBIDDEN
            }
            AttendanceError::RecordNotFound => StatusCode::NOT_FOUND,
            AttendanceError::LocationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}

impl From<sqlx::Error> for AttendanceError {
    fn from(e: sqlx::Error) -> Self {
        AttendanceError::Storage(e.to_string())
    }
}
