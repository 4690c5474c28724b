//! Record Store implementation
//!
//! Slot-vector store over a fixed page geometry.

use tracing::{debug, info};

use crate::config::{Config, UpdateMode};
use crate::error::{FdsError, Result};
use crate::format::{
    Geometry, ImageBuilder, PagePacker, PageScanner, RecordHeader, ScanStats, ScanStep,
    SkipReason, RECORD_HEADER_SIZE,
};
use crate::record::{pad_to_word, Record, RecordEntry, DELETED_KEY, INVALID_FILE_ID};

use super::Slot;

/// In-memory record store over one image
///
/// ## Record ids
/// Ids come from a counter that starts one past the largest id found on the
/// mounted image. They increase strictly in write order and are never
/// reused while the store lives. `serialize()` renumbers slots `1..=n` in
/// physical order, so a re-mounted image carries the encode-time ids.
///
/// Not thread-safe; callers sharing a store must synchronize externally.
#[derive(Debug, Clone)]
pub struct RecordStore {
    geometry: Geometry,
    update_mode: UpdateMode,
    /// Slots in physical order
    slots: Vec<Slot>,
    /// Next id to hand out
    next_record_id: u64,
}

impl RecordStore {
    /// Create an empty store with the given geometry
    pub fn new(geometry: Geometry, update_mode: UpdateMode) -> Self {
        Self {
            geometry,
            update_mode,
            slots: Vec::new(),
            next_record_id: 1,
        }
    }

    /// Create an empty store; the config must name the full geometry
    pub fn format(config: &Config) -> Result<Self> {
        let virtual_page_size = config
            .virtual_page_size
            .ok_or_else(|| FdsError::NoPages("page size not configured".to_string()))?;
        let virtual_pages = config
            .virtual_pages
            .ok_or_else(|| FdsError::NoPages("page count not configured".to_string()))?;
        let geometry = Geometry::new(virtual_page_size, virtual_pages)?;
        Ok(Self::new(geometry, config.update_mode))
    }

    /// Decode `image` into a store
    ///
    /// Page size and count are inferred when `config` leaves them unset.
    /// Tombstoned records and slots carrying the invalid file id are kept as
    /// dead slots. Malformed and erased headers hold no record and are not.
    /// Ids of invalid slots do not advance the id counter.
    pub fn mount(image: &[u8], config: &Config) -> Result<Self> {
        let geometry = Geometry::for_image(image, config)?;
        let mut store = Self::new(geometry, config.update_mode);
        let mut stats = ScanStats::default();
        let mut max_record_id = 0u32;

        for step in PageScanner::new(image, geometry.virtual_page_size) {
            stats.observe(&step);
            match step {
                ScanStep::Record(scanned) => {
                    if config.crc_check {
                        scanned.verify()?;
                    }
                    max_record_id = max_record_id.max(scanned.record.record_id);
                    store.slots.push(Slot::Live(scanned.record));
                }
                ScanStep::Deleted(scanned) => {
                    max_record_id = max_record_id.max(scanned.record.record_id);
                    store.slots.push(Slot::Tombstone(scanned.record));
                }
                ScanStep::Skipped(SkipReason::InvalidFileId { offset }) => {
                    // Occupies flash until compacted
                    if let Some(record) = record_at(image, offset) {
                        store.slots.push(Slot::Tombstone(record));
                    }
                }
                ScanStep::Skipped(_) | ScanStep::EndOfPage { .. } => {}
            }
        }
        store.next_record_id = max_record_id as u64 + 1;

        debug!(
            virtual_page_size = geometry.virtual_page_size,
            virtual_pages = geometry.virtual_pages,
            records = stats.records,
            deleted = stats.deleted,
            skipped = stats.skipped,
            "image mounted"
        );

        Ok(store)
    }

    // =========================================================================
    // Enumeration / Reads
    // =========================================================================

    /// Ids of all live records, in store order
    pub fn dir(&self) -> Vec<u32> {
        self.records().map(|r| r.record_id).collect()
    }

    /// Iterate over the live records
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Live(record) => Some(record),
            Slot::Tombstone(_) => None,
        })
    }

    /// All slots, tombstones included, in physical order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up a live record
    pub fn get(&self, record_id: u32) -> Option<&Record> {
        self.records().find(|r| r.record_id == record_id)
    }

    /// Read a live record as `(file_id, key, data)`
    pub fn read_record(&self, record_id: u32) -> Result<(u16, u16, Vec<u8>)> {
        let record = self.get(record_id).ok_or_else(|| not_found(record_id))?;
        Ok((record.file_id, record.key, record.data.clone()))
    }

    /// One entry per live record, in store order
    pub fn read_all(&self) -> Vec<RecordEntry> {
        self.records().map(RecordEntry::from).collect()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append a new record, returning its id
    ///
    /// `data` is zero-padded to a word boundary. No space check happens here;
    /// use [`write_record_checked`](Self::write_record_checked) or
    /// [`fits`](Self::fits) for that.
    pub fn write_record(&mut self, key: u16, file_id: u16, data: &[u8]) -> Result<u32> {
        if file_id == INVALID_FILE_ID {
            return Err(FdsError::InvalidArgument(format!(
                "file id 0x{:04x} is reserved",
                file_id
            )));
        }
        if key == DELETED_KEY {
            return Err(FdsError::InvalidArgument(format!(
                "record key 0x{:04x} is reserved",
                key
            )));
        }
        self.check_record_size(data)?;

        let record_id = self.allocate_record_id()?;
        self.slots.push(Slot::Live(Record::new(record_id, file_id, key, data)));
        Ok(record_id)
    }

    /// Like `write_record`, but fails with `NoSpaceInFlash` and leaves the
    /// store untouched if the result would not fit the image
    pub fn write_record_checked(&mut self, key: u16, file_id: u16, data: &[u8]) -> Result<u32> {
        self.guarded(|store| store.write_record(key, file_id, data))
    }

    /// Replace the data of a live record, returning the id that now holds it
    ///
    /// In `InPlace` mode the id and position are kept. In `Append` mode the
    /// old slot becomes a tombstone and a new record is appended.
    pub fn update_record(&mut self, record_id: u32, data: &[u8]) -> Result<u32> {
        let index = self.live_index(record_id)?;
        self.check_record_size(data)?;

        match self.update_mode {
            UpdateMode::InPlace => {
                if let Slot::Live(record) = &mut self.slots[index] {
                    record.data = pad_to_word(data);
                }
                Ok(record_id)
            }
            UpdateMode::Append => {
                let new_id = self.allocate_record_id()?;
                let (file_id, key) = {
                    let old = self.slots[index].record();
                    (old.file_id, old.key)
                };
                self.tombstone(index);
                self.slots.push(Slot::Live(Record::new(new_id, file_id, key, data)));
                Ok(new_id)
            }
        }
    }

    /// Like `update_record`, but fails with `NoSpaceInFlash` and leaves the
    /// store untouched if the result would not fit the image
    pub fn update_record_checked(&mut self, record_id: u32, data: &[u8]) -> Result<u32> {
        self.guarded(|store| store.update_record(record_id, data))
    }

    /// Delete a single live record
    pub fn delete_record(&mut self, record_id: u32) -> Result<()> {
        let index = self.live_index(record_id)?;
        self.tombstone(index);
        Ok(())
    }

    /// Delete every live record of `file_id`, returning how many were deleted
    pub fn delete_file(&mut self, file_id: u16) -> usize {
        let indices: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Live(r) if r.file_id == file_id))
            .map(|(i, _)| i)
            .collect();
        for &index in &indices {
            self.tombstone(index);
        }
        indices.len()
    }

    /// Drop all tombstones, reclaiming their space
    ///
    /// Live records keep their ids, order and data. Returns the number of
    /// words reclaimed.
    pub fn compact(&mut self) -> usize {
        let before = self.used_words();
        let dropped = self.slots.iter().filter(|slot| !slot.is_live()).count();
        self.slots.retain(Slot::is_live);
        let reclaimed = before.saturating_sub(self.used_words());

        info!(tombstones = dropped, reclaimed_words = reclaimed, "garbage collected");
        reclaimed
    }

    // =========================================================================
    // Serialization / Capacity
    // =========================================================================

    /// Encode the slot sequence into a fresh image
    ///
    /// Tombstones are written with the deleted key. Fails with
    /// `NoSpaceInFlash` if the slots do not fit; no partial image is returned.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut builder = ImageBuilder::new(self.geometry);
        for slot in &self.slots {
            match slot {
                Slot::Live(record) => builder.add(record.file_id, record.key, &record.data)?,
                Slot::Tombstone(record) => builder.add(record.file_id, DELETED_KEY, &record.data)?,
            };
        }
        Ok(builder.finish())
    }

    /// Page geometry of this store
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Words available for records on all data pages
    pub fn capacity_words(&self) -> usize {
        self.geometry.capacity_words()
    }

    /// Words consumed by the slot sequence when packed, page tails included
    pub fn used_words(&self) -> usize {
        let mut packer = PagePacker::new(self.geometry);
        for slot in &self.slots {
            if packer.place(slot_bytes(slot.record())).is_err() {
                return self.capacity_words();
            }
        }
        packer.used_words()
    }

    /// Words still free for records
    pub fn free_words(&self) -> usize {
        self.capacity_words() - self.used_words()
    }

    /// Words held by tombstones
    pub fn tombstone_words(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| !slot.is_live())
            .map(|slot| slot_bytes(slot.record()) / 4)
            .sum()
    }

    /// Whether `serialize()` would succeed
    pub fn fits(&self) -> bool {
        let mut packer = PagePacker::new(self.geometry);
        self.slots
            .iter()
            .all(|slot| packer.place(slot_bytes(slot.record())).is_ok())
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn live_index(&self, record_id: u32) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Slot::Live(r) if r.record_id == record_id))
            .ok_or_else(|| not_found(record_id))
    }

    fn tombstone(&mut self, index: usize) {
        if let Slot::Live(record) = &self.slots[index] {
            let record = record.clone();
            self.slots[index] = Slot::Tombstone(record);
        }
    }

    fn allocate_record_id(&mut self) -> Result<u32> {
        let record_id = u32::try_from(self.next_record_id)
            .map_err(|_| FdsError::Internal("record id space exhausted".to_string()))?;
        self.next_record_id += 1;
        Ok(record_id)
    }

    fn check_record_size(&self, data: &[u8]) -> Result<()> {
        let length_words = data.len().div_ceil(4);
        let max_words = self.geometry.max_record_words();
        if length_words > max_words {
            return Err(FdsError::RecordTooLarge {
                length_words,
                max_words,
            });
        }
        Ok(())
    }

    /// Run a mutation and roll it back if the slots no longer fit
    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved_slots = self.slots.clone();
        let saved_next = self.next_record_id;

        let value = op(self)?;
        if !self.fits() {
            self.slots = saved_slots;
            self.next_record_id = saved_next;
            return Err(FdsError::NoSpaceInFlash(format!(
                "{} of {} words used",
                self.used_words(),
                self.capacity_words()
            )));
        }
        Ok(value)
    }
}

/// The slot stored at byte `offset` of `image`, read without validation
fn record_at(image: &[u8], offset: usize) -> Option<Record> {
    let header = RecordHeader::decode(image.get(offset..)?)?;
    let start = offset + RECORD_HEADER_SIZE;
    let data = image.get(start..start + header.payload_len())?.to_vec();
    Some(Record {
        record_id: header.record_id,
        file_id: header.file_id,
        key: header.key,
        data,
    })
}

/// Physical size of a record slot in bytes
fn slot_bytes(record: &Record) -> usize {
    RECORD_HEADER_SIZE + record.length_words() * 4
}

fn not_found(record_id: u32) -> FdsError {
    FdsError::NotFound(format!("record {}", record_id))
}
