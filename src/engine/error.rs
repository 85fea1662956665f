//! Engine Error Taxonomy
//!
//! Every mutating engine operation is atomic: on any error the league
//! aggregate is left untouched. Errors carry an explicit kind so callers
//! can map them to transport-level responses without string matching.

use std::fmt;

/// Errors surfaced by the season replay engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Operation attempted out of the required state-machine order
    /// (simulate before draft completion, advance before simulate,
    /// double-settle). Recoverable by re-querying state; never corrupts it.
    InvalidState(String),

    /// Malformed input (unknown player id, stake <= 0, roster full,
    /// duplicate player). Rejected before any mutation.
    Validation(String),

    /// Requested date/game has no cached box score or odds yet.
    /// Never silently treated as a zero-score result.
    DataUnavailable(String),

    /// Unknown league/team/player/game id.
    NotFound(String),
}

impl EngineError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Stable machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "invalid_state",
            Self::Validation(_) => "validation",
            Self::DataUnavailable(_) => "data_unavailable",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::Validation(msg) => write!(f, "Validation failed: {}", msg),
            Self::DataUnavailable(msg) => write!(f, "Data unavailable: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
