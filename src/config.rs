use chrono::{NaiveDate, NaiveTime, Weekday};
use dotenvy::dotenv;
use std::env;

use crate::model::settings::{AttendanceSettings, GeoPoint, Geofence};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_check_per_min: u32,
    pub rate_query_per_min: u32,

    pub api_prefix: String,

    /// Nominatim-compatible endpoint; unset disables reverse geocoding.
    pub geocoder_url: Option<String>,

    // Seeds for the organization attendance settings snapshot. An admin
    // flow may replace the snapshot at runtime; these are the boot values.
    pub shift_check_in: NaiveTime,
    pub shift_check_out: NaiveTime,
    pub late_threshold_minutes: i64,
    pub half_day_threshold_hours: f64,
    pub working_days: Vec<Weekday>,
    pub holidays: Vec<NaiveDate>,
    pub location_required: bool,
    pub photo_required: bool,
    pub gps_accuracy_meters: f64,
    pub workplace_lat: f64,
    pub workplace_lng: f64,
    pub workplace_radius_meters: f64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            rate_check_per_min: env::var("RATE_CHECK_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_query_per_min: env::var("RATE_QUERY_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            geocoder_url: env::var("GEOCODER_URL").ok(),

            shift_check_in: env::var("SHIFT_CHECK_IN")
                .unwrap_or_else(|_| "09:00:00".to_string())
                .parse()
                .unwrap(),
            shift_check_out: env::var("SHIFT_CHECK_OUT")
                .unwrap_or_else(|_| "18:00:00".to_string())
                .parse()
                .unwrap(),
            late_threshold_minutes: env::var("LATE_THRESHOLD_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap(),
            half_day_threshold_hours: env::var("HALF_DAY_THRESHOLD_HOURS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap(),
            working_days: parse_working_days(
                &env::var("WORKING_DAYS").unwrap_or_else(|_| "Mon,Tue,Wed,Thu,Fri".to_string()),
            ),
            holidays: parse_holidays(&env::var("HOLIDAYS").unwrap_or_default()),
            location_required: env::var("LOCATION_REQUIRED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap(),
            photo_required: env::var("PHOTO_REQUIRED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap(),
            gps_accuracy_meters: env::var("GPS_ACCURACY_METERS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap(),
            workplace_lat: env::var("WORKPLACE_LAT")
                .expect("WORKPLACE_LAT must be set")
                .parse()
                .unwrap(),
            workplace_lng: env::var("WORKPLACE_LNG")
                .expect("WORKPLACE_LNG must be set")
                .parse()
                .unwrap(),
            workplace_radius_meters: env::var("WORKPLACE_RADIUS_METERS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap(),
        }
    }

    /// Boot-time snapshot of the organization settings.
    pub fn attendance_settings(&self) -> AttendanceSettings {
        AttendanceSettings {
            check_in_time: self.shift_check_in,
            check_out_time: self.shift_check_out,
            late_threshold_minutes: self.late_threshold_minutes,
            half_day_threshold_hours: self.half_day_threshold_hours,
            working_days: self.working_days.clone(),
            holidays: self.holidays.clone(),
            location_required: self.location_required,
            photo_required: self.photo_required,
            gps_accuracy_meters: self.gps_accuracy_meters,
            workplace: Geofence {
                center: GeoPoint {
                    latitude: self.workplace_lat,
                    longitude: self.workplace_lng,
                },
                radius_meters: self.workplace_radius_meters,
            },
        }
    }
}

fn parse_working_days(value: &str) -> Vec<Weekday> {
    value
        .split(',')
        .filter_map(|day| day.trim().parse::<Weekday>().ok())
        .collect()
}

fn parse_holidays(value: &str) -> Vec<NaiveDate> {
    value
        .split(',')
        .filter_map(|date| date.trim().parse::<NaiveDate>().ok())
        .collect()
}
