//! Time sources.
//!
//! Anything that derives a deadline from "now" (signed URL expiry, SigV4
//! request dates) reads the time through a [`Clock`] so that tests can pin it.

use std::fmt::Debug;

use chrono::{DateTime, Utc};

use crate::ConditionalSync;

/// A source of the current UTC time.
pub trait Clock: Debug + ConditionalSync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// The current time as whole seconds since the Unix epoch.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// The wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Pin the clock at `time`.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// Pin the clock at the given Unix timestamp (whole seconds).
    ///
    /// Timestamps outside the range chrono can represent fall back to the
    /// epoch.
    pub fn at_epoch_seconds(seconds: i64) -> Self {
        Self(DateTime::<Utc>::from_timestamp(seconds, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
