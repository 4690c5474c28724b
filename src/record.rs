//! Record definitions
//!
//! A record is a small blob tagged with a file id and a key.

use serde::Serialize;

/// File id reserved for invalid / never written slots
pub const INVALID_FILE_ID: u16 = 0xFFFF;

/// Key reserved for deleted slots
pub const DELETED_KEY: u16 = 0x0000;

/// A single record as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Unique identifier, never reused within a mounted store
    pub record_id: u32,

    /// Grouping tag
    pub file_id: u16,

    /// Identifier within the file
    pub key: u16,

    /// Payload, always a multiple of 4 bytes
    pub data: Vec<u8>,
}

impl Record {
    /// Create a record, zero-padding `data` to a word boundary
    pub fn new(record_id: u32, file_id: u16, key: u16, data: &[u8]) -> Self {
        Self {
            record_id,
            file_id,
            key,
            data: pad_to_word(data),
        }
    }

    /// Payload length in 32-bit words
    pub fn length_words(&self) -> usize {
        self.data.len().div_ceil(4)
    }

    /// Whether this record may be surfaced as live
    pub fn is_valid(&self) -> bool {
        self.file_id != INVALID_FILE_ID && self.key != DELETED_KEY
    }
}

/// Entry returned by `read_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEntry {
    pub file_id: u16,
    pub key: u16,
    pub record_id: u32,
    pub data: Vec<u8>,
}

impl From<&Record> for RecordEntry {
    fn from(record: &Record) -> Self {
        Self {
            file_id: record.file_id,
            key: record.key,
            record_id: record.record_id,
            data: record.data.clone(),
        }
    }
}

/// Zero-pad `data` up to the next multiple of 4 bytes
pub fn pad_to_word(data: &[u8]) -> Vec<u8> {
    let mut padded = Vec::with_capacity(data.len().div_ceil(4) * 4);
    padded.extend_from_slice(data);
    padded.resize(data.len().div_ceil(4) * 4, 0);
    padded
}
