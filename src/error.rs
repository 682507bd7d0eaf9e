//! Error types for the lunch planner.
//!
//! Uses thiserror for ergonomic error definition. Each subsystem has its own
//! error enum; the top-level [`Error`] aggregates them for the binary.

use chrono::NaiveDate;
use std::path::PathBuf;

/// Main error type for the planner
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Memory bank error
    #[error("Memory bank error: {0}")]
    Memory(#[from] MemoryError),

    /// Spreadsheet error
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Pipeline error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Notification error
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("{0} is not set")]
    Missing(&'static str),

    /// An environment variable has an unusable value
    #[error("invalid value for {var}: {value}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// The offending value
        value: String,
    },
}

/// Memory bank errors
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The memory file exists but cannot be parsed. Fatal; the caller decides
    /// whether to abort or reinitialize — the store never auto-repairs.
    #[error("memory bank at {path} is corrupt: {reason}")]
    CorruptStore {
        /// Path to the unreadable file
        path: PathBuf,
        /// Parse failure detail
        reason: String,
    },

    /// A meal is already recorded for this date. Indicates a rerun on the
    /// same day, not data loss; the bank is left unchanged.
    #[error("a meal is already recorded for {0}")]
    DuplicateDate(NaiveDate),

    /// Reading the memory file failed
    #[error("failed to read memory bank: {0}")]
    Read(#[source] std::io::Error),

    /// Writing the memory file failed. Nothing was committed; the previous
    /// state on disk is still valid.
    #[error("failed to persist memory bank: {0}")]
    Write(#[source] std::io::Error),
}

/// Spreadsheet fetch errors
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    /// API error from the Sheets endpoint
    #[error("Sheets API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

/// LLM provider errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// API error from provider
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider misconfiguration
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The generation stage produced no candidate that survives the variety
    /// and preference constraints. The run aborts before any write.
    #[error("no viable lunch candidates: {reason}")]
    EmptyCandidateSet {
        /// Why every candidate was rejected
        reason: String,
    },
}

/// Notification delivery errors. Non-fatal: the selection is already
/// persisted by the time notification is attempted.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Webhook endpoint rejected the message
    #[error("webhook error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
