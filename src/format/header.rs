//! Record Header
//!
//! Encoding, decoding and signing of the 12-byte record header.

use bytes::{Buf, BufMut};

use crate::crc::{crc16, crc16_update};

use super::{ERASED_BYTE, RECORD_HEADER_SIZE};

/// Byte range of the CRC field inside the header
const CRC_OFFSET: usize = 6;

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: u16,
    pub length_words: u16,
    pub file_id: u16,
    pub crc: u16,
    pub record_id: u32,
}

impl RecordHeader {
    /// Serialize to the on-flash byte layout
    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        let mut w = &mut buf[..];
        w.put_u16_le(self.key);
        w.put_u16_le(self.length_words);
        w.put_u16_le(self.file_id);
        w.put_u16_le(self.crc);
        w.put_u32_le(self.record_id);
        buf
    }

    /// Parse a header from the first 12 bytes of `bytes`
    ///
    /// Returns `None` if fewer than 12 bytes are available.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_HEADER_SIZE {
            return None;
        }
        let mut r = &bytes[..RECORD_HEADER_SIZE];
        Some(Self {
            key: r.get_u16_le(),
            length_words: r.get_u16_le(),
            file_id: r.get_u16_le(),
            crc: r.get_u16_le(),
            record_id: r.get_u32_le(),
        })
    }

    /// Whether the header bytes are still in the erased state
    pub fn is_erased(bytes: &[u8]) -> bool {
        bytes.len() >= RECORD_HEADER_SIZE
            && bytes[..RECORD_HEADER_SIZE].iter().all(|&b| b == ERASED_BYTE)
    }

    /// Payload length in bytes
    pub fn payload_len(&self) -> usize {
        self.length_words as usize * 4
    }

    /// Compute the CRC this header should carry for `payload`
    pub fn compute_crc(&self, payload: &[u8]) -> u16 {
        record_crc(&self.encode(), payload)
    }

    /// Return a copy with the CRC field filled in for `payload`
    pub fn signed(mut self, payload: &[u8]) -> Self {
        self.crc = self.compute_crc(payload);
        self
    }
}

/// CRC over an encoded header and its payload
///
/// The two CRC bytes at offset 6 are excluded from the checksum.
pub fn record_crc(header: &[u8; RECORD_HEADER_SIZE], payload: &[u8]) -> u16 {
    let crc = crc16(&header[..CRC_OFFSET]);
    let crc = crc16_update(crc, &header[CRC_OFFSET + 2..]);
    crc16_update(crc, payload)
}
