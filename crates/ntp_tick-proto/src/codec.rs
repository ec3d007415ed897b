// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{BigEndian, ByteOrder};

use crate::protocol::{ConstPackedSizeBytes, Packet, TimestampFormat};
use crate::unix_time::Timeval;

// Offset of the transmit timestamp within the header.
const TRANSMIT_OFFSET: usize = 40;

/// Serialize a client request: LI=0, VN=3, Mode=3, every other byte zero.
pub fn encode_request() -> [u8; Packet::PACKED_SIZE_BYTES] {
    Packet::request().encode()
}

/// Read the transmit timestamp of a reply as raw NTP seconds and fraction.
pub fn transmit_timestamp(reply: &[u8; Packet::PACKED_SIZE_BYTES]) -> TimestampFormat {
    TimestampFormat {
        seconds: BigEndian::read_u32(&reply[TRANSMIT_OFFSET..TRANSMIT_OFFSET + 4]),
        fraction: BigEndian::read_u32(&reply[TRANSMIT_OFFSET + 4..TRANSMIT_OFFSET + 8]),
    }
}

/// Decode the transmit timestamp of a reply into Unix seconds and microseconds.
///
/// No validation is performed: the caller has already checked the datagram
/// length, and no other header field is consulted.
pub fn decode_transmit_timestamp(reply: &[u8; Packet::PACKED_SIZE_BYTES]) -> Timeval {
    Timeval::from(transmit_timestamp(reply))
}
