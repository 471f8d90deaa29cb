//! Error types for smriti-pose.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Failure modes of the pose history engine and its components.
///
/// Every fallible operation returns one of these; nothing in the crate
/// panics on bad input. Callers decide whether to retry, skip, or escalate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Query timestamp lies outside the retained span, or the store is empty
    #[error("timestamp outside retained history")]
    OutOfRange,

    /// No entry matches the queried key, frame id, or timestamp
    #[error("no matching entry found")]
    NotFound,

    /// Insert with fail-on-duplicate policy collided with an existing entry
    #[error("entry already exists at t={timestamp_ms}")]
    DuplicateInsert {
        /// Timestamp of the rejected insert
        timestamp_ms: u32,
    },

    /// Insert timestamp is older than the retention horizon
    #[error("t={timestamp_ms} is older than the retention horizon (oldest allowed t={oldest_allowed_ms})")]
    TooOld {
        /// Timestamp of the rejected insert
        timestamp_ms: u32,
        /// Oldest timestamp the window currently admits
        oldest_allowed_ms: u32,
    },

    /// Attempted composition between poses from different frame lineages
    #[error("poses do not share a reference frame (frame {expected} vs {actual})")]
    MismatchedOrigin {
        /// Frame id of the first pose
        expected: u32,
        /// Frame id of the second pose
        actual: u32,
    },
}
