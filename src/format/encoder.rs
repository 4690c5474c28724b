//! Image Encoder
//!
//! Packs records greedily into pages and renders a complete image.

use bytes::BufMut;
use tracing::debug;

use crate::error::{FdsError, Result};
use crate::record::Record;

use super::{
    Geometry, RecordHeader, ERASED_BYTE, PAGE_HEADER_SIZE, PAGE_MAGIC, PAGE_TYPE_DATA,
    PAGE_TYPE_SWAP, RECORD_HEADER_SIZE,
};

/// Greedy page-fill cursor shared by the encoder and capacity accounting
///
/// Records go onto the current data page until the next one would overflow
/// it, then continue on the following page. Page 0 is never used.
#[derive(Debug, Clone)]
pub struct PagePacker {
    geometry: Geometry,
    /// Current data page
    page: usize,
    /// Next free byte within the current page
    offset: usize,
}

impl PagePacker {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            page: 1,
            offset: PAGE_HEADER_SIZE,
        }
    }

    /// Reserve `size` bytes, returning the byte offset in the image
    pub fn place(&mut self, size: usize) -> Result<usize> {
        let page_bytes = self.geometry.page_bytes();
        if size > page_bytes - PAGE_HEADER_SIZE {
            return Err(FdsError::RecordTooLarge {
                length_words: size.saturating_sub(RECORD_HEADER_SIZE) / 4,
                max_words: self.geometry.max_record_words(),
            });
        }

        if self.offset + size > page_bytes {
            self.page += 1;
            self.offset = PAGE_HEADER_SIZE;
        }
        if self.page >= self.geometry.virtual_pages {
            return Err(FdsError::NoSpaceInFlash(format!(
                "records do not fit in {} pages of {} words",
                self.geometry.virtual_pages, self.geometry.virtual_page_size
            )));
        }

        let at = self.page * page_bytes + self.offset;
        self.offset += size;
        Ok(at)
    }

    /// Words consumed so far, counting the unused tails of filled pages
    pub fn used_words(&self) -> usize {
        if self.page >= self.geometry.virtual_pages {
            return self.geometry.capacity_words();
        }
        let full_pages = self.page - 1;
        full_pages * self.geometry.page_capacity_words()
            + (self.offset - PAGE_HEADER_SIZE) / 4
    }
}

/// Builds an image record by record
pub struct ImageBuilder {
    image: Vec<u8>,
    packer: PagePacker,
    /// Number of records written (the last assigned record id)
    record_count: u32,
}

impl ImageBuilder {
    /// Create a builder with the swap page and every data page formatted
    pub fn new(geometry: Geometry) -> Self {
        let page_bytes = geometry.page_bytes();
        let mut image = vec![ERASED_BYTE; geometry.image_bytes()];

        for (index, page) in image.chunks_exact_mut(page_bytes).enumerate() {
            let page_type = if index == 0 {
                page.fill(0);
                PAGE_TYPE_SWAP
            } else {
                PAGE_TYPE_DATA
            };
            let mut w = &mut page[..PAGE_HEADER_SIZE];
            w.put_u32_le(PAGE_MAGIC);
            w.put_u32_le(page_type);
        }

        Self {
            image,
            packer: PagePacker::new(geometry),
            record_count: 0,
        }
    }

    /// Append a record, returning the record id it was written with
    ///
    /// Record ids are assigned `1, 2, 3, ...` in write order.
    pub fn add(&mut self, file_id: u16, key: u16, data: &[u8]) -> Result<u32> {
        let length_words = data.len().div_ceil(4);
        let length_words = u16::try_from(length_words).map_err(|_| FdsError::RecordTooLarge {
            length_words,
            max_words: u16::MAX as usize,
        })?;
        let payload_len = length_words as usize * 4;

        let at = self.packer.place(RECORD_HEADER_SIZE + payload_len)?;
        let record_id = self.record_count + 1;

        let payload_start = at + RECORD_HEADER_SIZE;
        let payload = &mut self.image[payload_start..payload_start + payload_len];
        payload[..data.len()].copy_from_slice(data);
        payload[data.len()..].fill(0);

        let header = RecordHeader {
            key,
            length_words,
            file_id,
            crc: 0,
            record_id,
        }
        .signed(&self.image[payload_start..payload_start + payload_len]);
        self.image[at..payload_start].copy_from_slice(&header.encode());

        self.record_count = record_id;
        Ok(record_id)
    }

    /// Words used by records so far
    pub fn used_words(&self) -> usize {
        self.packer.used_words()
    }

    /// Finish building and return the image bytes
    pub fn finish(self) -> Vec<u8> {
        debug!(
            records = self.record_count,
            used_words = self.packer.used_words(),
            "image encoded"
        );
        self.image
    }
}

/// Encode `records` into an image of `page_count` pages of `virtual_page_size` words
///
/// Record ids are renumbered `1..=n` in input order. Fails with
/// `NoSpaceInFlash` if the records do not all fit.
pub fn encode_records<'a, I>(records: I, page_count: usize, virtual_page_size: usize) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let geometry = Geometry::new(virtual_page_size, page_count)?;
    let mut builder = ImageBuilder::new(geometry);
    for record in records {
        builder.add(record.file_id, record.key, &record.data)?;
    }
    Ok(builder.finish())
}
