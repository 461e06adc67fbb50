use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

///
/// Clock
///
/// Millisecond wall clock used for generated ids and `modifiedAt`.
///

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

///
/// SystemClock
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

        u64::try_from(millis).unwrap_or_default()
    }
}

///
/// ManualClock
///
/// Externally driven clock for deterministic ids.
///

#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    #[must_use]
    pub const fn new(start_millis: u64) -> Self {
        Self(AtomicU64::new(start_millis))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
