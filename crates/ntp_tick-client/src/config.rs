// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Client configuration.
//!
//! ```
//! use std::time::Duration;
//! use ntp_tick_client::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .tick_period(Duration::from_millis(50))
//!     .timeout_ticks(100)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.timeout(), Duration::from_secs(5));
//! ```

use std::net::Ipv6Addr;
use std::time::Duration;

use crate::error::NtpError;

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Default number of ticks to wait for a unicast reply (30 s at the default
/// tick period).
pub const DEFAULT_TIMEOUT_TICKS: u32 = 300;

/// Default unicast hop limit.
pub const DEFAULT_HOP_LIMIT: u8 = 64;

/// Link-local NTP multicast group, `ff02::101`.
pub const NTP_MULTICAST_GROUP: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x101);

/// Tunables for an [`NtpClient`](crate::NtpClient).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Interval between `process()` calls made by the drivers.
    pub tick_period: Duration,
    /// Ticks a unicast request waits for its reply.
    pub timeout_ticks: u32,
    /// Hop limit used by the drivers when none is given.
    pub hop_limit: u8,
    /// Interface index used for multicast membership and link-local scope
    /// (0 = default interface).
    pub interface: u32,
    /// Group the listener driver subscribes to by default.
    pub multicast_group: Ipv6Addr,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            tick_period: DEFAULT_TICK_PERIOD,
            timeout_ticks: DEFAULT_TIMEOUT_TICKS,
            hop_limit: DEFAULT_HOP_LIMIT,
            interface: 0,
            multicast_group: NTP_MULTICAST_GROUP,
        }
    }
}

impl ClientConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    /// Wall-clock length of the unicast timeout.
    pub fn timeout(&self) -> Duration {
        self.tick_period.saturating_mul(self.timeout_ticks)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the tick period (default: 100 ms).
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.config.tick_period = period;
        self
    }

    /// Set the unicast timeout in ticks (default: 300).
    pub fn timeout_ticks(mut self, ticks: u32) -> Self {
        self.config.timeout_ticks = ticks;
        self
    }

    /// Set the default hop limit (default: 64).
    pub fn hop_limit(mut self, hops: u8) -> Self {
        self.config.hop_limit = hops;
        self
    }

    /// Set the interface index (default: 0).
    pub fn interface(mut self, index: u32) -> Self {
        self.config.interface = index;
        self
    }

    /// Set the default multicast group (default: `ff02::101`).
    pub fn multicast_group(mut self, group: Ipv6Addr) -> Self {
        self.config.multicast_group = group;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ClientConfig, NtpError> {
        if self.config.timeout_ticks == 0 {
            return Err(NtpError::InvalidArgument("timeout_ticks must be non-zero"));
        }
        if self.config.tick_period.is_zero() {
            return Err(NtpError::InvalidArgument("tick_period must be non-zero"));
        }
        Ok(self.config)
    }
}
