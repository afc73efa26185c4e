//! Error types for scheduler operations

use std::fmt;

/// Result type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Errors surfaced by the alarm scheduler
#[derive(Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// The operation requires a running scheduler. Callers must drive the
    /// lifecycle (start) before scheduling work.
    NotRunning,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::NotRunning => write!(f, "alarm scheduler is not running"),
        }
    }
}

impl std::error::Error for SchedulerError {}
