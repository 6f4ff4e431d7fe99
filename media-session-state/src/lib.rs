//! Media Session State
//!
//! Tracks the media sessions published by a host, picks the one session
//! that should be presented as "now playing", and notifies subscribers with
//! a de-duplicated stream of metadata and playback state updates.
//!
//! # Features
//!
//! - **Session Registry**: Reconciles tracked sessions against the host's live list
//! - **Arbitration**: At most one active session; playing sessions take over
//! - **Coalescing**: Metadata is only re-sent when the active session or its metadata changed
//! - **Fault Isolation**: A failing subscriber never affects the others
//!
//! # Architecture
//!
//! ```text
//! EventSource ──► queue ──► SessionRegistry ──► ArbitrationEngine ──► Dispatcher ──► callbacks
//!   (host)       (mpsc)     (reconcile/mutate)   (select, decide)      (fan-out)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use media_session_state::{MetadataMonitor, MonitorConfig};
//!
//! let mut monitor = MetadataMonitor::new(host_source, MonitorConfig::snapshot_on_subscribe())?;
//! monitor.subscribe(Box::new(NowPlayingWidget::default()))?;
//!
//! // Handle whatever the host pushed so far
//! monitor.process_pending();
//!
//! if let Some(session) = monitor.active_session() {
//!     println!("{} is active", session.package());
//! }
//! ```

// Core modules
pub mod arbitration;
pub mod dispatcher;
pub mod model;
pub mod registry;
pub mod session;
pub mod source;

// Monitor and its queue
pub mod monitor;
pub mod queue;

// Configuration
pub mod config;

// Error types
pub mod error;

// Logging infrastructure
pub mod logging;

// In-process source for tests and embedders
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use arbitration::{ActiveSelection, ArbitrationEngine, Cycle, MetadataUpdate};
pub use config::MonitorConfig;
pub use dispatcher::{CallbackError, CallbackResult, Dispatcher, MonitorCallback, SubscriberId};
pub use error::{MonitorError, Result, SourceError};
pub use model::{PackageName, PlaybackState, PlaybackStatus, SessionToken, TrackMetadata};
pub use monitor::{Flow, MetadataMonitor};
pub use queue::{Control, ControlChannel, ControlSender, Message};
pub use registry::{ReconcileReport, SessionRegistry, SessionSeed};
pub use session::SessionState;
pub use source::{EventSink, EventSource, InitialState, LiveSession, SourceEvent, WatchId};

pub use logging::{init_logging, init_logging_from_env, init_silent, LoggingError, LoggingMode};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::MonitorConfig;
    pub use crate::dispatcher::{CallbackResult, MonitorCallback, SubscriberId};
    pub use crate::error::{MonitorError, SourceError};
    pub use crate::model::{PackageName, PlaybackState, PlaybackStatus, SessionToken, TrackMetadata};
    pub use crate::monitor::MetadataMonitor;
    pub use crate::source::{EventSink, EventSource, InitialState, LiveSession, WatchId};
}
