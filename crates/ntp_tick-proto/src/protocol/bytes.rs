// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{BigEndian, ByteOrder};

use crate::error::ParseError;

use super::traits::ensure_len;
use super::{
    ConstPackedSizeBytes, FromBytes, LeapIndicator, Mode, Packet, TimestampFormat, ToBytes,
    Version, pack_li_vn_mode, unpack_li_vn_mode,
};

// Byte offsets of the header fields.
const STRATUM: usize = 1;
const POLL: usize = 2;
const PRECISION: usize = 3;
const ROOT_DELAY: usize = 4;
const ROOT_DISPERSION: usize = 8;
const REFERENCE_ID: usize = 12;
const REFERENCE_TS: usize = 16;
const ORIGIN_TS: usize = 24;
const RECEIVE_TS: usize = 32;
const TRANSMIT_TS: usize = 40;

impl FromBytes for TimestampFormat {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        let seconds = BigEndian::read_u32(&buf[0..4]);
        let fraction = BigEndian::read_u32(&buf[4..8]);
        Ok((
            TimestampFormat { seconds, fraction },
            Self::PACKED_SIZE_BYTES,
        ))
    }
}

impl ToBytes for TimestampFormat {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        BigEndian::write_u32(&mut buf[0..4], self.seconds);
        BigEndian::write_u32(&mut buf[4..8], self.fraction);
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl Packet {
    /// Decode a full header. Infallible: the array type guarantees the length
    /// and every bit pattern of the packed first byte is representable.
    pub fn decode(buf: &[u8; Packet::PACKED_SIZE_BYTES]) -> Packet {
        let (li, vn, mode) = unpack_li_vn_mode(buf[0]);
        let ts = |at: usize| TimestampFormat {
            seconds: BigEndian::read_u32(&buf[at..at + 4]),
            fraction: BigEndian::read_u32(&buf[at + 4..at + 8]),
        };
        Packet {
            leap_indicator: LeapIndicator::from_bits(li),
            version: Version::from_bits(vn),
            mode: Mode::from_bits(mode),
            stratum: buf[STRATUM],
            poll: buf[POLL] as i8,
            precision: buf[PRECISION] as i8,
            root_delay: BigEndian::read_u32(&buf[ROOT_DELAY..ROOT_DELAY + 4]),
            root_dispersion: BigEndian::read_u32(&buf[ROOT_DISPERSION..ROOT_DISPERSION + 4]),
            reference_id: BigEndian::read_u32(&buf[REFERENCE_ID..REFERENCE_ID + 4]),
            reference_timestamp: ts(REFERENCE_TS),
            origin_timestamp: ts(ORIGIN_TS),
            receive_timestamp: ts(RECEIVE_TS),
            transmit_timestamp: ts(TRANSMIT_TS),
        }
    }

    /// Encode the header into its 48-byte wire form.
    pub fn encode(&self) -> [u8; Packet::PACKED_SIZE_BYTES] {
        let mut buf = [0u8; Packet::PACKED_SIZE_BYTES];
        buf[0] = pack_li_vn_mode(
            self.leap_indicator as u8,
            self.version.value(),
            self.mode as u8,
        );
        buf[STRATUM] = self.stratum;
        buf[POLL] = self.poll as u8;
        buf[PRECISION] = self.precision as u8;
        BigEndian::write_u32(&mut buf[ROOT_DELAY..ROOT_DELAY + 4], self.root_delay);
        BigEndian::write_u32(
            &mut buf[ROOT_DISPERSION..ROOT_DISPERSION + 4],
            self.root_dispersion,
        );
        BigEndian::write_u32(&mut buf[REFERENCE_ID..REFERENCE_ID + 4], self.reference_id);
        for (at, ts) in [
            (REFERENCE_TS, self.reference_timestamp),
            (ORIGIN_TS, self.origin_timestamp),
            (RECEIVE_TS, self.receive_timestamp),
            (TRANSMIT_TS, self.transmit_timestamp),
        ] {
            BigEndian::write_u32(&mut buf[at..at + 4], ts.seconds);
            BigEndian::write_u32(&mut buf[at + 4..at + 8], ts.fraction);
        }
        buf
    }
}

impl FromBytes for Packet {
    /// Reads the first 48 bytes of `buf`; trailing extension fields or a MAC
    /// are left unconsumed.
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        let mut header = [0u8; Packet::PACKED_SIZE_BYTES];
        header.copy_from_slice(&buf[..Self::PACKED_SIZE_BYTES]);
        Ok((Packet::decode(&header), Self::PACKED_SIZE_BYTES))
    }
}

impl ToBytes for Packet {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        buf[..Self::PACKED_SIZE_BYTES].copy_from_slice(&self.encode());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}
