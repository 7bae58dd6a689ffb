//! Types used throughout `fab`.
//!
//! The goal of this crate is to be very lightweight, so take care with adding dependencies.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Last modified time of a file, as reported by `stat`.
///
/// A file that does not exist has no [`Mtime`] at all (`Option::None`), which is distinct from a
/// file that was last modified at the Unix epoch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mtime {
    /// Seconds since the Unix epoch, negative for times before it.
    pub secs: i64,
    /// Nanoseconds.
    ///
    /// Not all filesystems provide this, thus often it will be 0.
    pub nanos: u32,
}

impl Mtime {
    pub const fn new(secs: i64, nanos: u32) -> Self {
        Mtime { secs, nanos }
    }

    pub const fn from_secs(secs: i64) -> Self {
        Mtime { secs, nanos: 0 }
    }
}

impl From<SystemTime> for Mtime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Mtime {
                secs: i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
                nanos: after.subsec_nanos(),
            },
            Err(err) => {
                // Before the epoch, round towards negative infinity so ordering is preserved.
                let before = err.duration();
                let mut secs = -i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
                let mut nanos = before.subsec_nanos();
                if nanos > 0 {
                    secs -= 1;
                    nanos = 1_000_000_000 - nanos;
                }
                Mtime { secs, nanos }
            }
        }
    }
}

impl fmt::Display for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}
