// ── Injectable wall clock ──
//
// Record timestamps come from a `Clock` so that tests can pin them.
// Scheduling itself runs on tokio time, which tests pause and advance.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};

/// Source of record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: ArcSwap<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: ArcSwap::from_pointee(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.store(Arc::new(now));
    }

    pub fn advance(&self, by: Duration) {
        self.now.rcu(|current| Arc::new(**current + by));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        **self.now.load()
    }
}
