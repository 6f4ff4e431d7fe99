//! Error types for media-session-state

use thiserror::Error;

/// Result type for media-session-state operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors reported by an [`EventSource`](crate::source::EventSource)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The host media session service cannot be reached
    #[error("Media session service unavailable: {0}")]
    Unavailable(String),

    /// The host refused access to its session list
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A session's controller is gone
    #[error("Controller for session {0} is unreachable")]
    ControllerUnreachable(String),
}

/// Errors that can occur while monitoring media sessions
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The event source could not be reached while constructing the monitor
    #[error("Event source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// The monitor has been released
    #[error("Monitor has been released")]
    Released,
}
