// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP wire types and constants.
//!
//! Only the fixed 48-byte header is modelled. Every header field except the
//! transmit timestamp is carried through verbatim: the client never
//! interprets stratum, poll, precision, root delay, root dispersion or the
//! reference identifier.
//!
//! Field documentation is derived from IETF RFC 5905.

/// NTP port number.
pub const PORT: u16 = 123;

/// Size of the NTP header on the wire.
pub const PACKET_LEN: usize = 48;

/// Version number written into client requests.
pub const REQUEST_VERSION: u8 = 3;

// Bit layout of the first header byte: LI (2) | VN (3) | Mode (3).
const LI_SHIFT: u8 = 6;
const VN_SHIFT: u8 = 3;
const LI_MASK: u8 = 0b11;
const VN_MASK: u8 = 0b111;
const MODE_MASK: u8 = 0b111;

/// Pack the leap indicator, version and mode into the first header byte.
///
/// Values wider than their field are masked, so the result never bleeds
/// into a neighbouring field.
pub fn pack_li_vn_mode(leap_indicator: u8, version: u8, mode: u8) -> u8 {
    ((leap_indicator & LI_MASK) << LI_SHIFT)
        | ((version & VN_MASK) << VN_SHIFT)
        | (mode & MODE_MASK)
}

/// Split the first header byte into `(leap_indicator, version, mode)`.
pub fn unpack_li_vn_mode(byte: u8) -> (u8, u8, u8) {
    (
        (byte >> LI_SHIFT) & LI_MASK,
        (byte >> VN_SHIFT) & VN_MASK,
        byte & MODE_MASK,
    )
}

mod bytes;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_client_request_byte() {
        // 00 011 011
        assert_eq!(pack_li_vn_mode(0, 3, 3), 0x1B);
    }

    #[test]
    fn pack_masks_oversized_fields() {
        assert_eq!(pack_li_vn_mode(0xFF, 0, 0), 0b1100_0000);
        assert_eq!(pack_li_vn_mode(0, 0xFF, 0), 0b0011_1000);
        assert_eq!(pack_li_vn_mode(0, 0, 0xFF), 0b0000_0111);
    }

    #[test]
    fn unpack_every_byte() {
        for byte in 0..=u8::MAX {
            let (li, vn, mode) = unpack_li_vn_mode(byte);
            assert_eq!(pack_li_vn_mode(li, vn, mode), byte);
        }
    }

    #[test]
    fn unpack_server_reply_byte() {
        // LI=3 (unsynchronized), VN=4, Mode=4 (server)
        assert_eq!(unpack_li_vn_mode(0xE4), (3, 4, 4));
    }
}
