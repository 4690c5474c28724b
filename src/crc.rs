//! CRC Engine
//!
//! 16-bit checksum used for record integrity. The recurrence is the
//! byte-at-a-time shift/xor form used by the device firmware (it yields the
//! CRC-16/CCITT-FALSE values) and is computed without a lookup table.

/// Initial value of the checksum register
pub const CRC16_INIT: u16 = 0xFFFF;

/// Compute the checksum of `bytes`
pub fn crc16(bytes: &[u8]) -> u16 {
    crc16_update(CRC16_INIT, bytes)
}

/// Continue a checksum over further bytes
///
/// `crc16_update(crc16(a), b) == crc16(a ++ b)`.
pub fn crc16_update(mut crc: u16, bytes: &[u8]) -> u16 {
    for &d in bytes {
        crc = crc.rotate_left(8);
        crc ^= d as u16;
        crc ^= (crc & 0xFF) >> 4;
        crc ^= crc << 12;
        crc ^= (crc & 0xFF) << 5;
    }
    crc
}
