//! Time source and monotonic id allocation for locally created records.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use time::{Duration, OffsetDateTime};

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "application::clock";

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock truncated to millisecond precision, matching what persisted
/// timestamps can represent.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let millis = now.nanosecond() / 1_000_000 * 1_000_000;
        now.replace_nanosecond(millis).unwrap_or(now)
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = mutex_lock(&self.now, SOURCE, "advance");
        *guard += by;
    }

    pub fn set(&self, value: OffsetDateTime) {
        *mutex_lock(&self.now, SOURCE, "set") = value;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *mutex_lock(&self.now, SOURCE, "now")
    }
}

/// Millisecond-timestamp ids that never repeat within a process, even when
/// several records are created in the same millisecond.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: AtomicI64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: OffsetDateTime) -> i64 {
        let candidate = millis_since_epoch(now);
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let next = candidate.max(current + 1);
            match self
                .last
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Next `<prefix><millis>` id that `taken` does not already claim.
    pub fn next_id(
        &self,
        prefix: &str,
        now: OffsetDateTime,
        taken: impl Fn(&str) -> bool,
    ) -> String {
        loop {
            let id = format!("{prefix}{}", self.next(now));
            if !taken(&id) {
                return id;
            }
        }
    }
}

fn millis_since_epoch(value: OffsetDateTime) -> i64 {
    let millis = value.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// `now`, unless that would not move strictly past `previous`.
pub fn strictly_after(now: OffsetDateTime, previous: OffsetDateTime) -> OffsetDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
