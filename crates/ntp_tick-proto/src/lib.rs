// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP packet codec for the tick-driven NTP client.
//!
//! This crate provides the fixed 48-byte wire representation of an NTP message
//! (RFC 958 / RFC 5905 header layout), the buffer-based parsing and
//! serialization traits, and the conversion of a reply's transmit timestamp
//! into Unix seconds and microseconds.
//!
//! The crate is `no_std` when the default `std` feature is disabled.
//!
//! # Example
//!
//! ```
//! use ntp_tick_proto::codec::{decode_transmit_timestamp, encode_request};
//!
//! let request = encode_request();
//! assert_eq!(request[0], 0x1B); // LI=0, VN=3, Mode=3
//!
//! let mut reply = request;
//! reply[40..44].copy_from_slice(&(2_208_988_800u32 + 1_000_000_000).to_be_bytes());
//! let tv = decode_transmit_timestamp(&reply);
//! assert_eq!(tv.secs(), 1_000_000_000);
//! assert_eq!(tv.usecs(), 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Error type for buffer-based NTP packet parsing and serialization.
pub mod error;

/// NTP wire types, header bit packing and byte-level traits.
pub mod protocol;

/// Request encoding and reply timestamp decoding.
pub mod codec;

/// Conversion between NTP timestamps and Unix `(seconds, microseconds)`.
pub mod unix_time;
