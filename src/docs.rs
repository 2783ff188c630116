use crate::api::attendance::{CheckPayload, LocationDto};
use crate::model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceStats, AttendanceStatus, CheckMethod,
};
use crate::model::settings::GeoPoint;
use crate::service::StatsPeriod;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Verification API",
        version = "1.0.0",
        description = r#"
## Geofenced Attendance Service

This API records when an employee is physically present, classifies that
presence into an attendance status, and gates each record on geospatial
proof-of-location.

### 🔹 Key Features
- **Check-in / Check-out**
  - One record per employee per day, geofence-verified when a position is supplied
- **Status Classification**
  - Present / late / half-day verdicts derived from shift configuration
- **Approval**
  - HR/Admin sign-off for manual (unverified) entries; verification is one-way
- **History & Stats**
  - Date-range history and per-period aggregates derived from stored records

### 🔐 Security
Authentication is handled by the gateway in front of this service, which
injects `X-Employee-Id` and `X-Role` headers on the internal network.

### 📦 Response Format
- JSON-based RESTful responses
- Every error renders as `{"message": "..."}` with an actionable text

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::stats,
        crate::api::attendance::approve,
    ),
    components(
        schemas(
            CheckPayload,
            LocationDto,
            AttendanceRecord,
            AttendanceEntry,
            AttendanceStatus,
            CheckMethod,
            AttendanceStats,
            StatsPeriod,
            GeoPoint
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance verification and classification APIs"),
    )
)]
pub struct ApiDoc;
