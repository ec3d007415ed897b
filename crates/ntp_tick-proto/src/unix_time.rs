// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use crate::protocol;

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// NTP fraction units per microsecond.
///
/// The fraction is 1/2³² s (~233 ps); 2³² / 10⁶ ≈ 4294.97, rounded to 4295.
/// Dividing by it truncates, so a decoded value can read up to 8 µs low near
/// the top of a second.
pub const FRAC_PER_MICROSECOND: u32 = 4295;

/// A Unix time split into whole seconds and microseconds, as decoded from the
/// transmit timestamp of an NTP reply.
///
/// Seconds are relative to `1970-01-01T00:00:00Z` and are negative for NTP
/// timestamps earlier than the Unix epoch.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timeval {
    secs: i64,
    usecs: u32,
}

impl Timeval {
    /// Create a new **Timeval**. `usecs` is not range-checked.
    pub fn new(secs: i64, usecs: u32) -> Timeval {
        Timeval { secs, usecs }
    }

    /// Whole seconds since the Unix epoch.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Microseconds within the second.
    pub fn usecs(&self) -> u32 {
        self.usecs
    }

    /// Convert to a `std::time::SystemTime`.
    #[cfg(feature = "std")]
    pub fn to_system_time(&self) -> std::time::SystemTime {
        let sub = std::time::Duration::from_micros(self.usecs as u64);
        if self.secs >= 0 {
            std::time::UNIX_EPOCH + std::time::Duration::from_secs(self.secs as u64) + sub
        } else {
            std::time::UNIX_EPOCH - std::time::Duration::from_secs(self.secs.unsigned_abs()) + sub
        }
    }
}

impl fmt::Display for Timeval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.usecs)
    }
}

impl From<protocol::TimestampFormat> for Timeval {
    /// `secs = seconds − 2208988800`, `usecs = fraction / 4295`.
    fn from(ts: protocol::TimestampFormat) -> Self {
        Timeval {
            secs: ts.seconds as i64 - EPOCH_DELTA,
            usecs: ts.fraction / FRAC_PER_MICROSECOND,
        }
    }
}

impl From<Timeval> for protocol::TimestampFormat {
    /// Inverse of the decode conversion.
    ///
    /// The seconds are truncated to 32 bits (era information is lost). The
    /// fraction is `usecs × 4295`, saturating at `u32::MAX`, so decoding the
    /// result reproduces `usecs` exactly for every value below 999 993.
    fn from(tv: Timeval) -> Self {
        let fraction = (tv.usecs as u64 * FRAC_PER_MICROSECOND as u64).min(u32::MAX as u64);
        protocol::TimestampFormat {
            seconds: (tv.secs + EPOCH_DELTA) as u32,
            fraction: fraction as u32,
        }
    }
}
