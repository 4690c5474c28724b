//! # fdstore
//!
//! An append-only record store over fixed-size flash pages:
//! - Bit-exact page/record codec with CRC-16 record integrity
//! - Page geometry inference from page magic boundaries
//! - Best-effort decoding that skips torn/malformed record headers
//! - Tombstone deletes and compaction, as block-erase flash requires
//! - Engine facade with the device's status-code call interface
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Engine (Command)                          │
//! │           mount / write / update / read / gc                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    RecordStore                               │
//! │            (live records + tombstones)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Decoder   │          │   Encoder   │
//!   │ (PageScan)  │          │ (PagePack)  │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │ Header / CRC │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod crc;
pub mod record;
pub mod format;
pub mod store;
pub mod command;
pub mod engine;
pub mod image;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FdsError, Result, Status};
pub use config::{Config, UpdateMode};
pub use record::{Record, RecordEntry};
pub use store::RecordStore;
pub use command::{Command, Reply};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fdstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
