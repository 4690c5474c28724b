//! Image Decoder
//!
//! Walks the pages of an image and reports every record slot it meets.
//!
//! Decoding is best effort: a header whose length runs past the end of its
//! page is skipped and the scan resynchronizes on the next 12 bytes, since
//! flash commonly holds torn writes. Erased space (all `0xFF`) decodes as
//! such a header too, so a record written after an erased gap is still
//! found. A page ends once fewer than 12 bytes remain. Each step is reported as a
//! [`ScanStep`] so callers can see what was skipped and why.

use tracing::{trace, warn};

use crate::error::{FdsError, Result};
use crate::record::{Record, DELETED_KEY, INVALID_FILE_ID};

use super::{RecordHeader, PAGE_HEADER_SIZE, PAGE_MAGIC, PAGE_TYPE_DATA, RECORD_HEADER_SIZE, WORD_SIZE};

/// Why a page or slot produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page does not start with the page magic
    BadPageMagic { page: usize },

    /// The page is formatted but is not a data page (e.g. the swap page)
    NotDataPage { page: usize, page_type: u32 },

    /// The slot carries the reserved invalid file id
    InvalidFileId { offset: usize },

    /// The header's length runs past the end of its page (erased space included)
    Truncated { offset: usize, length_words: u16 },
}

/// A record slot as found on the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub record: Record,
    /// CRC stored in the header
    pub crc: u16,
    /// Byte offset of the header in the image
    pub offset: usize,
}

impl ScannedRecord {
    /// Recompute the CRC from the header fields and payload
    pub fn computed_crc(&self) -> u16 {
        let header = RecordHeader {
            key: self.record.key,
            length_words: (self.record.data.len() / WORD_SIZE) as u16,
            file_id: self.record.file_id,
            crc: 0,
            record_id: self.record.record_id,
        };
        header.compute_crc(&self.record.data)
    }

    /// Fail with `CrcCheckFailed` if the stored CRC does not match
    pub fn verify(&self) -> Result<()> {
        let computed = self.computed_crc();
        if computed != self.crc {
            return Err(FdsError::CrcCheckFailed {
                record_id: self.record.record_id,
                stored: self.crc,
                computed,
            });
        }
        Ok(())
    }
}

/// Outcome of one scan step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStep {
    /// A live record
    Record(ScannedRecord),

    /// A tombstoned record (key 0x0000)
    Deleted(ScannedRecord),

    /// A page or slot that yields nothing
    Skipped(SkipReason),

    /// Fewer than a header's worth of bytes left on this data page
    EndOfPage { page: usize },
}

/// Step-by-step scanner over all pages of an image
pub struct PageScanner<'a> {
    image: &'a [u8],
    page_bytes: usize,
    page_count: usize,
    /// Page being scanned
    page: usize,
    /// Offset within the current page, `None` until its header is checked
    cursor: Option<usize>,
}

impl<'a> PageScanner<'a> {
    /// Scan `image` split into pages of `virtual_page_size` words
    pub fn new(image: &'a [u8], virtual_page_size: usize) -> Self {
        let page_bytes = virtual_page_size * WORD_SIZE;
        let page_count = if page_bytes == 0 {
            0
        } else {
            image.len().div_ceil(page_bytes)
        };
        Self {
            image,
            page_bytes,
            page_count,
            page: 0,
            cursor: None,
        }
    }

    fn advance_page(&mut self) {
        self.page += 1;
        self.cursor = None;
    }

    /// Check the page header and position the cursor after it
    fn open_page(&mut self, page: &[u8]) -> Option<SkipReason> {
        let word = |at: usize| {
            page.get(at..at + WORD_SIZE)
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        };

        if word(0) != Some(PAGE_MAGIC) {
            return Some(SkipReason::BadPageMagic { page: self.page });
        }
        match word(4) {
            Some(PAGE_TYPE_DATA) => {
                self.cursor = Some(PAGE_HEADER_SIZE);
                None
            }
            other => Some(SkipReason::NotDataPage {
                page: self.page,
                page_type: other.unwrap_or(0),
            }),
        }
    }
}

impl<'a> Iterator for PageScanner<'a> {
    type Item = ScanStep;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.page >= self.page_count {
                return None;
            }

            let image = self.image;
            let start = self.page * self.page_bytes;
            let end = (start + self.page_bytes).min(image.len());
            let page = &image[start..end];

            let offset = match self.cursor {
                Some(offset) => offset,
                None => {
                    if let Some(reason) = self.open_page(page) {
                        trace!(page = self.page, ?reason, "page skipped");
                        self.advance_page();
                        return Some(ScanStep::Skipped(reason));
                    }
                    continue;
                }
            };

            let rest = &page[offset..];
            let header = match RecordHeader::decode(rest) {
                Some(header) => header,
                None => {
                    let page = self.page;
                    self.advance_page();
                    return Some(ScanStep::EndOfPage { page });
                }
            };

            let at = start + offset;
            let payload_len = header.payload_len();
            if payload_len > rest.len() - RECORD_HEADER_SIZE {
                // Erased flash reads as a 0xFFFF-word header
                if RecordHeader::is_erased(rest) {
                    trace!(offset = at, "erased header, resynchronizing");
                } else {
                    warn!(
                        offset = at,
                        length_words = header.length_words,
                        "record header overruns page, resynchronizing"
                    );
                }
                self.cursor = Some(offset + RECORD_HEADER_SIZE);
                return Some(ScanStep::Skipped(SkipReason::Truncated {
                    offset: at,
                    length_words: header.length_words,
                }));
            }
            self.cursor = Some(offset + RECORD_HEADER_SIZE + payload_len);

            if header.file_id == INVALID_FILE_ID {
                return Some(ScanStep::Skipped(SkipReason::InvalidFileId { offset: at }));
            }

            let payload = &rest[RECORD_HEADER_SIZE..RECORD_HEADER_SIZE + payload_len];
            let scanned = ScannedRecord {
                record: Record {
                    record_id: header.record_id,
                    file_id: header.file_id,
                    key: header.key,
                    data: payload.to_vec(),
                },
                crc: header.crc,
                offset: at,
            };

            return Some(if header.key == DELETED_KEY {
                ScanStep::Deleted(scanned)
            } else {
                ScanStep::Record(scanned)
            });
        }
    }
}

/// Iterator over the live records of an image
pub struct RecordIter<'a> {
    scanner: PageScanner<'a>,
    crc_check: bool,
    failed: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for step in self.scanner.by_ref() {
            if let ScanStep::Record(scanned) = step {
                if self.crc_check {
                    if let Err(e) = scanned.verify() {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                return Some(Ok(scanned.record));
            }
        }
        None
    }
}

/// Decode the live records of `image` in physical order
///
/// Invalid, deleted and malformed slots are filtered out. With `crc_check`
/// the first CRC mismatch ends the sequence with `CrcCheckFailed`.
pub fn decode_records(image: &[u8], virtual_page_size: usize, crc_check: bool) -> RecordIter<'_> {
    RecordIter {
        scanner: PageScanner::new(image, virtual_page_size),
        crc_check,
        failed: false,
    }
}

/// Counts of what a scan encountered
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Data pages scanned to their end
    pub data_pages: usize,
    /// Live records
    pub records: usize,
    /// Tombstoned records
    pub deleted: usize,
    /// Pages and slots skipped, for any reason
    pub skipped: usize,
    /// Slots skipped because their header overran the page
    pub truncated: usize,
}

impl ScanStats {
    /// Account for one scan step
    pub fn observe(&mut self, step: &ScanStep) {
        match step {
            ScanStep::Record(_) => self.records += 1,
            ScanStep::Deleted(_) => self.deleted += 1,
            ScanStep::Skipped(reason) => {
                self.skipped += 1;
                if matches!(reason, SkipReason::Truncated { .. }) {
                    self.truncated += 1;
                }
            }
            ScanStep::EndOfPage { .. } => self.data_pages += 1,
        }
    }
}

/// Scan a whole image and return its statistics
pub fn scan_image(image: &[u8], virtual_page_size: usize) -> ScanStats {
    let mut stats = ScanStats::default();
    for step in PageScanner::new(image, virtual_page_size) {
        stats.observe(&step);
    }
    stats
}
