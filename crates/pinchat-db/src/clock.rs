//! Time source for message timestamps and presence.
//!
//! Production code uses [`SystemClock`]. Tests swap in [`FixedClock`] so the
//! presence window boundary and same-instant appends can be reproduced
//! exactly.

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use std::fmt::Debug;

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// Fixed-width UTC format, so stored timestamps sort lexicographically.
const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
/// Sub-second digits kept by [`STORAGE_FORMAT`].
const STORAGE_PRECISION: u16 = 6;

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Drops the precision [`to_storage`] would lose, so a value handed back
/// to callers equals the one read back later.
pub fn truncate(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(STORAGE_PRECISION)
}

pub fn to_storage(ts: &DateTime<Utc>) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

/// Manually driven clock. Never advances on its own.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default())
    }
}
