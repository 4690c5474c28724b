//! Flash Format Module
//!
//! Binary page/record layout of a flash data storage image.
//!
//! ## Image Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Page 0 (swap)                                           │
//! │   PageMagic: u32 (4) | SwapMagic: u32 (4) | zero fill   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Page 1..N (data)                                        │
//! │   PageMagic: u32 (4) | DataMagic: u32 (4)               │
//! │   [Record Header (12)][Payload (length_words * 4)]      │
//! │   ... packed sequentially ...                           │
//! │   0xFF fill (erased flash)                              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Record Header (12 bytes, little-endian)
//! ```text
//! ┌─────────┬──────────────┬─────────────┬─────────┬────────────────┐
//! │ Key (2) │ LenWords (2) │ FileId (2)  │ CRC (2) │ RecordId (4)   │
//! └─────────┴──────────────┴─────────────┴─────────┴────────────────┘
//! ```

mod decoder;
mod encoder;
mod geometry;
mod header;

pub use decoder::{decode_records, scan_image, PageScanner, RecordIter, ScanStats, ScanStep, ScannedRecord, SkipReason};
pub use encoder::{encode_records, ImageBuilder, PagePacker};
pub use geometry::{guess_page_size, Geometry};
pub use header::{record_crc, RecordHeader};

// =============================================================================
// Shared Constants (used by header, decoder, encoder, geometry)
// =============================================================================

/// Magic word at the start of every formatted page
pub const PAGE_MAGIC: u32 = 0xDEAD_C0DE;

/// Page-type word of the swap page
pub const PAGE_TYPE_SWAP: u32 = 0xF11E_01FF;

/// Page-type word of a data page
pub const PAGE_TYPE_DATA: u32 = 0xF11E_01FE;

/// Size of a flash word in bytes
pub const WORD_SIZE: usize = 4;

/// Page header size: PageMagic (4) + PageType (4) = 8 bytes
pub const PAGE_HEADER_SIZE: usize = 8;

/// Page header size in words
pub const PAGE_HEADER_WORDS: usize = PAGE_HEADER_SIZE / WORD_SIZE;

/// Record header size: Key (2) + LenWords (2) + FileId (2) + CRC (2) + RecordId (4) = 12 bytes
pub const RECORD_HEADER_SIZE: usize = 12;

/// Record header size in words
pub const RECORD_HEADER_WORDS: usize = RECORD_HEADER_SIZE / WORD_SIZE;

/// Minimum erase granularity; images and inferred pages are multiples of this
pub const ERASE_UNIT: usize = 256;

/// Value of erased flash bytes
pub const ERASED_BYTE: u8 = 0xFF;
