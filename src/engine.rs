//! Engine Module
//!
//! Mount-state facade over a [`RecordStore`] exposing the device engine's
//! call interface.
//!
//! ## Responsibilities
//! - Track whether an image is mounted (`NotInitialized` otherwise)
//! - Enforce flash capacity on every write and update
//! - Dispatch [`Command`] values
//! - Report outcomes as [`Status`] codes

use tracing::debug;

use crate::command::{Command, Reply};
use crate::config::Config;
use crate::error::{FdsError, Result, Status};
use crate::record::RecordEntry;
use crate::store::RecordStore;

/// Flash data storage engine
///
/// Each engine owns its mounted image; there is no shared global state.
/// Writes and updates fail with `NoSpaceInFlash` as soon as the image is
/// full, which callers answer with [`gc`](Self::gc) and a retry.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// The mounted store, if any
    store: Option<RecordStore>,
}

impl Engine {
    /// Create an unmounted engine
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Create an engine with a freshly formatted, empty image mounted
    pub fn format(config: Config) -> Result<Self> {
        let store = RecordStore::format(&config)?;
        Ok(Self {
            config,
            store: Some(store),
        })
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation
    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Mount { image } => {
                self.mount(&image)?;
                Ok(Reply::Done)
            }
            Command::Dir => Ok(Reply::RecordIds(self.dir()?)),
            Command::Write { key, file_id, data } => {
                Ok(Reply::RecordId(self.write(key, file_id, &data)?))
            }
            Command::Update { record_id, data } => {
                Ok(Reply::RecordId(self.update(record_id, &data)?))
            }
            Command::Read { record_id } => {
                let (file_id, key, data) = self.read(record_id)?;
                Ok(Reply::Record { file_id, key, data })
            }
            Command::ReadAll => Ok(Reply::Records(self.read_all()?)),
            Command::DeleteRecord { record_id } => {
                self.delete_record(record_id)?;
                Ok(Reply::Done)
            }
            Command::DeleteFile { file_id } => {
                self.delete_file(file_id)?;
                Ok(Reply::Done)
            }
            Command::GarbageCollect => {
                self.gc()?;
                Ok(Reply::Done)
            }
        }
    }

    /// Status code for the outcome of any operation
    pub fn status_of<T>(result: &Result<T>) -> Status {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }

    // =========================================================================
    // Mount lifecycle
    // =========================================================================

    /// Mount `image`, replacing any previously mounted one
    pub fn mount(&mut self, image: &[u8]) -> Result<()> {
        let store = RecordStore::mount(image, &self.config)?;
        debug!(records = store.len(), "engine mounted");
        self.store = Some(store);
        Ok(())
    }

    /// Drop the mounted image, returning its store
    pub fn unmount(&mut self) -> Option<RecordStore> {
        self.store.take()
    }

    pub fn is_mounted(&self) -> bool {
        self.store.is_some()
    }

    /// The mounted store
    pub fn store(&self) -> Result<&RecordStore> {
        self.store.as_ref().ok_or_else(not_mounted)
    }

    fn store_mut(&mut self) -> Result<&mut RecordStore> {
        self.store.as_mut().ok_or_else(not_mounted)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Ids of all live records
    pub fn dir(&self) -> Result<Vec<u32>> {
        Ok(self.store()?.dir())
    }

    /// Write a record, failing with `NoSpaceInFlash` if it does not fit
    pub fn write(&mut self, key: u16, file_id: u16, data: &[u8]) -> Result<u32> {
        self.store_mut()?.write_record_checked(key, file_id, data)
    }

    /// Update a record, failing with `NoSpaceInFlash` if it does not fit
    pub fn update(&mut self, record_id: u32, data: &[u8]) -> Result<u32> {
        self.store_mut()?.update_record_checked(record_id, data)
    }

    /// Read a record as `(file_id, key, data)`
    pub fn read(&self, record_id: u32) -> Result<(u16, u16, Vec<u8>)> {
        self.store()?.read_record(record_id)
    }

    /// Read every live record
    pub fn read_all(&self) -> Result<Vec<RecordEntry>> {
        Ok(self.store()?.read_all())
    }

    /// Delete a single record
    pub fn delete_record(&mut self, record_id: u32) -> Result<()> {
        self.store_mut()?.delete_record(record_id)
    }

    /// Delete every record of a file
    pub fn delete_file(&mut self, file_id: u16) -> Result<()> {
        let deleted = self.store_mut()?.delete_file(file_id);
        debug!(file_id, deleted, "file deleted");
        Ok(())
    }

    /// Garbage collect: reclaim space held by deleted records
    pub fn gc(&mut self) -> Result<()> {
        self.store_mut()?.compact();
        Ok(())
    }

    /// Serialize the mounted store into an image
    pub fn image(&self) -> Result<Vec<u8>> {
        self.store()?.serialize()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn not_mounted() -> FdsError {
    FdsError::NotInitialized("no image mounted".to_string())
}
