use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

/// Trusted time source. Every expiry decision reads it fresh.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn remaining_millis(started_at: DateTime<Utc>, duration_seconds: i64, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - started_at).num_milliseconds();
    (duration_seconds.saturating_mul(1000) - elapsed).max(0)
}

/// Whole seconds left in a section, never negative. Partial seconds round up
/// so a countdown never shows zero while the section is still open.
pub fn remaining_seconds(started_at: DateTime<Utc>, duration_seconds: i64, now: DateTime<Utc>) -> i64 {
    let millis = remaining_millis(started_at, duration_seconds, now);
    (millis + 999) / 1000
}

/// Expired once nothing remains, i.e. `now >= started_at + duration`.
pub fn is_expired(started_at: DateTime<Utc>, duration_seconds: i64, now: DateTime<Utc>) -> bool {
    remaining_millis(started_at, duration_seconds, now) == 0
}

/// Server-side snapshot a client uses to render its countdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionTimer {
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub remaining_seconds: i64,
    pub server_time: DateTime<Utc>,
}

impl SectionTimer {
    pub fn at(started_at: DateTime<Utc>, duration_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration_seconds,
            remaining_seconds: remaining_seconds(started_at, duration_seconds, now),
            server_time: now,
        }
    }
}
