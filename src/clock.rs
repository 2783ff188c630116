use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Injectable source of "now" so date-keying and classification stay
/// deterministic under test.
pub trait Clock: Send + Sync {
    /// Instant for audit fields (`created_at` / `updated_at`).
    fn now_utc(&self) -> DateTime<Utc>;
    /// Local wall clock; attendance days and shift times are local concepts.
    fn now_local(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
