//! Page Geometry
//!
//! Page size / page count of an image, and page-size inference from the
//! page magic boundaries.

use crate::config::Config;
use crate::error::{FdsError, Result};

use super::{ERASE_UNIT, PAGE_HEADER_WORDS, PAGE_MAGIC, RECORD_HEADER_WORDS, WORD_SIZE};

/// Fixed geometry of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Page size in 32-bit words
    pub virtual_page_size: usize,
    /// Number of pages, including the swap page
    pub virtual_pages: usize,
}

impl Geometry {
    /// Create a geometry, validating that a page can hold at least one record header
    pub fn new(virtual_page_size: usize, virtual_pages: usize) -> Result<Self> {
        if virtual_pages == 0 {
            return Err(FdsError::NoPages("page count is zero".to_string()));
        }
        if virtual_page_size <= PAGE_HEADER_WORDS + RECORD_HEADER_WORDS {
            return Err(FdsError::InvalidArgument(format!(
                "page size of {} words cannot hold a record",
                virtual_page_size
            )));
        }
        if virtual_page_size > u16::MAX as usize {
            return Err(FdsError::InvalidArgument(format!(
                "page size of {} words exceeds {}",
                virtual_page_size,
                u16::MAX
            )));
        }
        Ok(Self {
            virtual_page_size,
            virtual_pages,
        })
    }

    /// Resolve the geometry of `image` from `config`, inferring what is unknown
    pub fn for_image(image: &[u8], config: &Config) -> Result<Self> {
        if image.len() % ERASE_UNIT != 0 {
            return Err(FdsError::InvalidArgument(format!(
                "image length {} is not a multiple of {}",
                image.len(),
                ERASE_UNIT
            )));
        }

        let virtual_page_size = match config.virtual_page_size {
            Some(words) => words,
            None => guess_page_size(image).ok_or_else(|| {
                FdsError::NoPages("cannot infer page size from image".to_string())
            })?,
        };
        if virtual_page_size == 0 {
            return Err(FdsError::InvalidArgument("page size is zero".to_string()));
        }

        let image_words = image.len() / WORD_SIZE;
        if image_words % virtual_page_size != 0 {
            return Err(FdsError::InvalidArgument(format!(
                "image of {} words is not a whole number of {}-word pages",
                image_words, virtual_page_size
            )));
        }

        let derived_pages = image_words / virtual_page_size;
        let virtual_pages = match config.virtual_pages {
            Some(pages) if pages != derived_pages => {
                return Err(FdsError::InvalidArgument(format!(
                    "image holds {} pages, configured for {}",
                    derived_pages, pages
                )));
            }
            Some(pages) => pages,
            None => derived_pages,
        };

        Self::new(virtual_page_size, virtual_pages)
    }

    /// Page size in bytes
    pub fn page_bytes(&self) -> usize {
        self.virtual_page_size * WORD_SIZE
    }

    /// Image size in bytes
    pub fn image_bytes(&self) -> usize {
        self.page_bytes() * self.virtual_pages
    }

    /// Words available for record headers and payloads on one data page
    pub fn page_capacity_words(&self) -> usize {
        self.virtual_page_size - PAGE_HEADER_WORDS
    }

    /// Words available for records across all data pages
    pub fn capacity_words(&self) -> usize {
        self.page_capacity_words() * self.virtual_pages.saturating_sub(1)
    }

    /// Largest payload (in words) a single record may carry
    pub fn max_record_words(&self) -> usize {
        (self.page_capacity_words() - RECORD_HEADER_WORDS).min(u16::MAX as usize)
    }
}

/// Infer the page size (in words) of an image from its page magic boundaries
///
/// The image must start with a page magic, every page must have the same
/// length and that length must be a multiple of the erase unit.
pub fn guess_page_size(image: &[u8]) -> Option<usize> {
    let magic = PAGE_MAGIC.to_le_bytes();
    let starts = magic_offsets(image, &magic);

    if starts.first() != Some(&0) {
        return None;
    }

    let mut page_len = None;
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(image.len());
        let len = end - start;
        match page_len {
            None => page_len = Some(len),
            Some(expected) if expected != len => return None,
            Some(_) => {}
        }
    }

    let page_len = page_len?;
    if page_len % ERASE_UNIT != 0 {
        return None;
    }
    Some(page_len / WORD_SIZE)
}

/// Non-overlapping offsets of `needle` in `haystack`, scanning left to right
fn magic_offsets(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        if &haystack[pos..pos + needle.len()] == needle {
            offsets.push(pos);
            pos += needle.len();
        } else {
            pos += 1;
        }
    }
    offsets
}
