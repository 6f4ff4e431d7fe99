use media_session_state::MonitorError;
use thiserror::Error;

/// Errors that can occur in the session monitor manager
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The monitor could not be created or refused the request
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Error spawning the worker thread
    #[error("Failed to spawn monitor worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// The worker thread is gone and no longer accepts commands
    #[error("Monitor worker has stopped")]
    WorkerDisconnected,

    /// The worker thread panicked
    #[error("Monitor worker panicked")]
    WorkerPanicked,
}

/// Result type for manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;
