use thiserror::Error;

/// Errors raised while reading, writing, or checking a journal.
#[derive(Error, Debug)]
pub enum JournalError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// File header is not a pairgate journal header.
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),
    /// A record frame header is malformed.
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Byte offset of the frame header.
        offset: u64,
        /// What is wrong with it.
        reason: String,
    },
    /// Payload is larger than a frame can carry.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Offending payload size.
        size: u64,
        /// Frame payload limit.
        max: u32,
    },
    /// Event payload is not UTF-8.
    #[error("invalid UTF-8 in event payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Event payload is not valid event JSON.
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// File is shorter than a header but not empty.
    #[error("file has {0} bytes, too short for a journal header")]
    ShortFile(u64),
    /// A frame ends before its declared length (strict mode only).
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Byte offset where the frame starts.
        offset: u64,
    },
}
