use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::api::identity::Identity;
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStats};
use crate::service::{AttendanceService, CheckData, StatsPeriod, SubmittedLocation};

#[derive(Deserialize, ToSchema)]
pub struct LocationDto {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    /// GPS accuracy radius reported by the device; omit when unknown.
    #[schema(example = 12.5, nullable = true)]
    pub accuracy_meters: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({
    "location": { "latitude": 23.8103, "longitude": 90.4125, "accuracy_meters": 12.5 },
    "photo": "blobs/2026/01/05/emp-1000-in.jpg",
    "notes": null
}))]
pub struct CheckPayload {
    /// Device position at the moment of the check; optional for manual entries.
    pub location: Option<LocationDto>,
    /// Opaque reference to an already-uploaded photo blob.
    #[schema(example = "blobs/2026/01/05/emp-1000-in.jpg", nullable = true)]
    pub photo: Option<String>,
    #[schema(example = "client visit in the morning", nullable = true)]
    pub notes: Option<String>,
}

impl CheckPayload {
    fn into_check_data(self) -> CheckData {
        CheckData {
            location: self.location.map(|l| SubmittedLocation {
                latitude: l.latitude,
                longitude: l.longitude,
                accuracy_meters: l.accuracy_meters,
            }),
            photo: self.photo,
            notes: self.notes,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// First day of the range, inclusive
    #[param(example = "2026-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    /// Last day of the range, inclusive
    #[param(example = "2026-01-31", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Aggregation window ending today
    #[param(example = "month")]
    pub period: StatsPeriod,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body(
        content = CheckPayload,
        description = "Check-in facts from the client device",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRecord),
        (status = 400, description = "Already checked in, or location failed validation", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location permission denied"),
        (status = 503, description = "Location could not be acquired"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    identity: Identity,
    service: web::Data<AttendanceService>,
    payload: web::Json<CheckPayload>,
) -> Result<impl Responder, AttendanceError> {
    let record = service
        .check_in(identity.employee_id, payload.into_inner().into_check_data())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body(
        content = CheckPayload,
        description = "Check-out facts from the client device",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRecord),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location permission denied"),
        (status = 503, description = "Location could not be acquired"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    identity: Identity,
    service: web::Data<AttendanceService>,
    payload: web::Json<CheckPayload>,
) -> Result<impl Responder, AttendanceError> {
    let record = service
        .check_out(identity.employee_id, payload.into_inner().into_check_data())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Today's attendance record for the calling employee
#[utoipa::path(
    get,
    path = "/api/v1/attendance/today",
    responses(
        (status = 200, description = "Today's record", body = AttendanceRecord),
        (status = 404, description = "No record yet today", body = Object, example = json!({
            "message": "No attendance record for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Attendance"
)]
pub async fn today(
    identity: Identity,
    service: web::Data<AttendanceService>,
) -> Result<impl Responder, AttendanceError> {
    match service.today_record(identity.employee_id).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No attendance record for today"
        }))),
    }
}

/// Attendance history over a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Records in the range, oldest first", body = [AttendanceRecord]),
        (status = 400, description = "Inverted range", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Attendance"
)]
pub async fn history(
    identity: Identity,
    service: web::Data<AttendanceService>,
    query: web::Query<HistoryQuery>,
) -> Result<impl Responder, AttendanceError> {
    let records = service
        .history(identity.employee_id, query.start_date, query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Aggregated attendance stats for a period
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Aggregates derived from stored records", body = AttendanceStats),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Attendance"
)]
pub async fn stats(
    identity: Identity,
    service: web::Data<AttendanceService>,
    query: web::Query<StatsQuery>,
) -> Result<impl Responder, AttendanceError> {
    let stats = service.stats(identity.employee_id, query.period).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Approve an attendance record (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{record_id}/approve",
    params(
        ("record_id" = u64, Path, description = "ID of the attendance record to approve")
    ),
    responses(
        (status = 200, description = "Record approved (idempotent)", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not approve attendance", body = Object, example = json!({
            "message": "You are not allowed to approve attendance records"
        })),
        (status = 404, description = "Record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        }))
    ),
    tag = "Attendance"
)]
pub async fn approve(
    identity: Identity,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<impl Responder, AttendanceError> {
    let record_id = path.into_inner();
    let record = service
        .approve(record_id, identity.employee_id, identity.can_approve())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}
