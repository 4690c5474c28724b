//! Record Store Module
//!
//! In-memory model of a mounted image.
//!
//! ## Responsibilities
//! - Decode an image into its slot sequence (mount)
//! - Write, update, read and delete records in the logical view
//! - Account for physical space, including space held by tombstones
//! - Reclaim tombstoned space (compact)
//! - Re-encode the slot sequence into a fresh image (serialize)
//!
//! ## Slot Model
//! The store keeps slots in physical order. A deleted or superseded record
//! stays in place as a tombstone until `compact()`, exactly as it would on
//! flash, so `serialize()` runs out of space where the device would.

mod record_store;

pub use record_store::RecordStore;

use crate::record::Record;

/// Slot held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A live record
    Live(Record),

    /// A deleted or invalid record that still occupies flash
    Tombstone(Record),
}

impl Slot {
    pub fn record(&self) -> &Record {
        match self {
            Slot::Live(record) | Slot::Tombstone(record) => record,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Slot::Live(_))
    }
}
