//! Error types for fdstore
//!
//! Every failure maps onto one entry of the fixed flash data storage status
//! enumeration, so callers can branch on [`Status`] exactly as they would on
//! the device's return codes.

use thiserror::Error;

/// Result type alias using FdsError
pub type Result<T> = std::result::Result<T, FdsError>;

/// Status codes returned by the storage engine
///
/// `Success` is the distinguished zero value; the remaining codes are
/// numbered in the order the device firmware defines them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    Timeout = 1,
    NotInitialized = 2,
    UnalignedAddress = 3,
    InvalidArgument = 4,
    NullArgument = 5,
    NoOpenRecord = 6,
    NoSpaceInFlash = 7,
    NoSpaceInQueue = 8,
    RecordTooLarge = 9,
    NotFound = 10,
    NoPages = 11,
    UserLimitReached = 12,
    CrcCheckFailed = 13,
    Busy = 14,
    Internal = 15,
}

impl Status {
    const ALL: [Status; 16] = [
        Status::Success,
        Status::Timeout,
        Status::NotInitialized,
        Status::UnalignedAddress,
        Status::InvalidArgument,
        Status::NullArgument,
        Status::NoOpenRecord,
        Status::NoSpaceInFlash,
        Status::NoSpaceInQueue,
        Status::RecordTooLarge,
        Status::NotFound,
        Status::NoPages,
        Status::UserLimitReached,
        Status::CrcCheckFailed,
        Status::Busy,
        Status::Internal,
    ];

    /// Numeric status code
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a status by its numeric code
    pub fn from_code(code: u32) -> Option<Status> {
        Self::ALL.get(code as usize).copied()
    }

    /// Symbolic name as used by the device SDK
    pub fn name(self) -> &'static str {
        match self {
            Status::Success => "FDS_SUCCESS",
            Status::Timeout => "FDS_ERR_OPERATION_TIMEOUT",
            Status::NotInitialized => "FDS_ERR_NOT_INITIALIZED",
            Status::UnalignedAddress => "FDS_ERR_UNALIGNED_ADDR",
            Status::InvalidArgument => "FDS_ERR_INVALID_ARG",
            Status::NullArgument => "FDS_ERR_NULL_ARG",
            Status::NoOpenRecord => "FDS_ERR_NO_OPEN_RECORDS",
            Status::NoSpaceInFlash => "FDS_ERR_NO_SPACE_IN_FLASH",
            Status::NoSpaceInQueue => "FDS_ERR_NO_SPACE_IN_QUEUES",
            Status::RecordTooLarge => "FDS_ERR_RECORD_TOO_LARGE",
            Status::NotFound => "FDS_ERR_NOT_FOUND",
            Status::NoPages => "FDS_ERR_NO_PAGES",
            Status::UserLimitReached => "FDS_ERR_USER_LIMIT_REACHED",
            Status::CrcCheckFailed => "FDS_ERR_CRC_CHECK_FAILED",
            Status::Busy => "FDS_ERR_BUSY",
            Status::Internal => "FDS_ERR_INTERNAL",
        }
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Status::Success => "The operation completed successfully.",
            Status::Timeout => "The operation timed out.",
            Status::NotInitialized => "The module has not been initialized.",
            Status::UnalignedAddress => "The input data is not aligned to a word boundary.",
            Status::InvalidArgument => "The parameter contains invalid data.",
            Status::NullArgument => "The parameter is NULL.",
            Status::NoOpenRecord => "The record is not open, so it cannot be closed.",
            Status::NoSpaceInFlash => "There is no space in flash memory.",
            Status::NoSpaceInQueue => "There is no space in the internal queues.",
            Status::RecordTooLarge => "The record exceeds the maximum allowed size.",
            Status::NotFound => "The record was not found.",
            Status::NoPages => "No flash pages are available.",
            Status::UserLimitReached => "The maximum number of users has been reached.",
            Status::CrcCheckFailed => "The CRC check failed.",
            Status::Busy => "The underlying flash subsystem was busy.",
            Status::Internal => "An internal error occurred.",
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Unified error type for fdstore operations
#[derive(Debug, Error)]
pub enum FdsError {
    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Operation timed out")]
    Timeout,

    #[error("Store not initialized: {0}")]
    NotInitialized(String),

    #[error("Unaligned address: {0}")]
    UnalignedAddress(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing argument: {0}")]
    NullArgument(String),

    #[error("No open record")]
    NoOpenRecord,

    #[error("No space in queue")]
    NoSpaceInQueue,

    #[error("User limit reached")]
    UserLimitReached,

    #[error("Flash busy")]
    Busy,

    #[error("Internal error: {0}")]
    Internal(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("No space in flash: {0}")]
    NoSpaceInFlash(String),

    #[error("Record too large: {length_words} words (max {max_words})")]
    RecordTooLarge { length_words: usize, max_words: usize },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("No pages: {0}")]
    NoPages(String),

    // -------------------------------------------------------------------------
    // Integrity Errors
    // -------------------------------------------------------------------------
    #[error("CRC check failed for record {record_id}: stored 0x{stored:04x}, computed 0x{computed:04x}")]
    CrcCheckFailed {
        record_id: u32,
        stored: u16,
        computed: u16,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FdsError {
    /// The status code this error reports as
    pub fn status(&self) -> Status {
        match self {
            FdsError::Timeout => Status::Timeout,
            FdsError::NotInitialized(_) => Status::NotInitialized,
            FdsError::UnalignedAddress(_) => Status::UnalignedAddress,
            FdsError::InvalidArgument(_) => Status::InvalidArgument,
            FdsError::NullArgument(_) => Status::NullArgument,
            FdsError::NoOpenRecord => Status::NoOpenRecord,
            FdsError::NoSpaceInQueue => Status::NoSpaceInQueue,
            FdsError::UserLimitReached => Status::UserLimitReached,
            FdsError::Busy => Status::Busy,
            FdsError::Internal(_) => Status::Internal,
            FdsError::NoSpaceInFlash(_) => Status::NoSpaceInFlash,
            FdsError::RecordTooLarge { .. } => Status::RecordTooLarge,
            FdsError::NotFound(_) => Status::NotFound,
            FdsError::NoPages(_) => Status::NoPages,
            FdsError::CrcCheckFailed { .. } => Status::CrcCheckFailed,
            FdsError::Io(_) => Status::Internal,
        }
    }
}
