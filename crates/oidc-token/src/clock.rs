//! Injectable time source
//!
//! Verification compares token timestamps against "now". Production code
//! reads the wall clock through [`SystemClock`]; tests pin an instant with
//! [`FixedClock`].

use std::fmt::Debug;

/// Source of the verification instant, in Unix seconds
pub trait Clock: Send + Sync + Debug {
    /// Current time as seconds since the Unix epoch
    fn now(&self) -> i64;
}

/// Wall-clock time via `chrono`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl FixedClock {
    /// Clock pinned at `unix_seconds`
    pub fn at(unix_seconds: i64) -> Self {
        Self(unix_seconds)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}
