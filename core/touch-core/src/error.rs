//! Error types for touch-core operations.
//!
//! Protocol errors live in `tuio_protocol::DecodeError`; they are non-fatal and
//! never escape the pipeline. Everything here is either a transport condition
//! the caller must act on, or a setup failure.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Channel Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Conditions reported by the ring channel.
///
/// `WouldBlock` and `Interrupted` are expected during normal operation;
/// the rest mean the caller has to change what it is doing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("a {0} session is already open")]
    Busy(SessionKind),

    #[error("no message available")]
    WouldBlock,

    #[error("read interrupted")]
    Interrupted,

    #[error("message of {len} bytes exceeds slot capacity of {max}")]
    OversizeMessage { len: usize, max: usize },

    #[error("buffer of {available} bytes cannot hold {needed}-byte message")]
    BufferTooSmall { needed: usize, available: usize },
}

impl ChannelError {
    /// True for conditions a caller may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChannelError::WouldBlock | ChannelError::Interrupted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Reader,
    Writer,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Reader => f.write_str("reader"),
            SessionKind::Writer => f.write_str("writer"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Crate Error
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can stop a touch-core caller.
#[derive(Debug, thiserror::Error)]
pub enum TouchError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // ─────────────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Format(#[from] tuio_protocol::FormatError),

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TouchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TouchError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using TouchError.
pub type Result<T> = std::result::Result<T, TouchError>;
