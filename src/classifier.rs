use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::model::attendance::AttendanceStatus;
use crate::model::settings::AttendanceSettings;

/// Classifies a day from the facts available so far. Pure: re-run it every
/// time a new stamp lands for the record.
///
/// With only a check-in the verdict is provisional (Present or Late). Once a
/// check-out exists, a total below the half-day threshold becomes HalfDay
/// and overrides the earlier Present/Late verdict.
pub fn classify(
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
    settings: &AttendanceSettings,
) -> AttendanceStatus {
    if let Some(check_out) = check_out {
        let hours_worked = (check_out - check_in).num_seconds() as f64 / 3600.0;
        if hours_worked < settings.half_day_threshold_hours {
            return AttendanceStatus::HalfDay;
        }
    }

    if lateness_minutes(check_in, settings) > settings.late_threshold_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// End-of-day reconciliation rule: a working day that closes with no record
/// is an absence. This service never applies the transition itself; the
/// nightly reconciliation job is expected to call this for every employee
/// without a record at the cutoff and persist the result. Non-working days
/// and holidays are never classified, hence `None`.
pub fn absent_if_unrecorded(
    date: NaiveDate,
    settings: &AttendanceSettings,
) -> Option<AttendanceStatus> {
    if settings.is_working_day(date) {
        Some(AttendanceStatus::Absent)
    } else {
        None
    }
}

/// Minutes past the scheduled check-in time, negative when early.
fn lateness_minutes(check_in: NaiveDateTime, settings: &AttendanceSettings) -> i64 {
    let expected = settings.check_in_time.num_seconds_from_midnight() as i64 / 60;
    let actual = check_in.time().num_seconds_from_midnight() as i64 / 60;
    actual - expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::{GeoPoint, Geofence};
    use chrono::Weekday;

    fn settings() -> AttendanceSettings {
        AttendanceSettings {
            check_in_time: "09:00:00".parse().unwrap(),
            check_out_time: "18:00:00".parse().unwrap(),
            late_threshold_minutes: 15,
            half_day_threshold_hours: 4.0,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: vec![NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()],
            location_required: true,
            photo_required: false,
            gps_accuracy_meters: 50.0,
            workplace: Geofence {
                center: GeoPoint {
                    latitude: 23.8103,
                    longitude: 90.4125,
                },
                radius_meters: 100.0,
            },
        }
    }

    fn ts(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn within_grace_period_is_present() {
        let status = classify(ts("2026-01-05T09:05:00"), None, &settings());
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn lateness_exactly_at_threshold_is_still_present() {
        let status = classify(ts("2026-01-05T09:15:00"), None, &settings());
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn past_grace_period_is_late() {
        let status = classify(ts("2026-01-05T09:20:00"), None, &settings());
        assert_eq!(status, AttendanceStatus::Late);
    }

    #[test]
    fn short_day_becomes_half_day() {
        let status = classify(
            ts("2026-01-05T09:00:00"),
            Some(ts("2026-01-05T12:00:00")),
            &settings(),
        );
        assert_eq!(status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn half_day_overrides_late() {
        // Late arrival and a short day: the half-day verdict wins.
        let status = classify(
            ts("2026-01-05T10:30:00"),
            Some(ts("2026-01-05T13:00:00")),
            &settings(),
        );
        assert_eq!(status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn full_day_after_late_arrival_stays_late() {
        let status = classify(
            ts("2026-01-05T09:20:00"),
            Some(ts("2026-01-05T18:00:00")),
            &settings(),
        );
        assert_eq!(status, AttendanceStatus::Late);
    }

    #[test]
    fn full_day_on_time_is_present() {
        let status = classify(
            ts("2026-01-05T08:55:00"),
            Some(ts("2026-01-05T18:00:00")),
            &settings(),
        );
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn unrecorded_working_day_reconciles_to_absent() {
        // 2026-01-05 is a Monday.
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(
            absent_if_unrecorded(date, &settings()),
            Some(AttendanceStatus::Absent)
        );
    }

    #[test]
    fn weekends_and_holidays_are_never_classified() {
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let holiday = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(absent_if_unrecorded(saturday, &settings()), None);
        assert_eq!(absent_if_unrecorded(holiday, &settings()), None);
    }
}
