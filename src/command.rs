//! Command definitions
//!
//! The call interface of the flash data storage engine, as values.

use crate::record::RecordEntry;

/// Operations accepted by [`Engine::execute`](crate::Engine::execute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mount an image
    Mount { image: Vec<u8> },

    /// List live record ids
    Dir,

    /// Write a new record
    Write { key: u16, file_id: u16, data: Vec<u8> },

    /// Replace the data of a record
    Update { record_id: u32, data: Vec<u8> },

    /// Read one record
    Read { record_id: u32 },

    /// Read every live record
    ReadAll,

    /// Delete one record
    DeleteRecord { record_id: u32 },

    /// Delete every record of a file
    DeleteFile { file_id: u16 },

    /// Reclaim space held by deleted records
    GarbageCollect,
}

/// Successful outcome of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Completed with nothing to return
    Done,

    /// Id of a written or updated record
    RecordId(u32),

    /// Live record ids
    RecordIds(Vec<u32>),

    /// Contents of one record
    Record { file_id: u16, key: u16, data: Vec<u8> },

    /// Contents of all live records
    Records(Vec<RecordEntry>),
}
