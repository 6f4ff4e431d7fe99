//! # Media Session Manager
//!
//! A sync-first facade that runs a media session metadata monitor on a
//! dedicated worker thread.
//!
//! ## Overview
//!
//! `MetadataMonitor` must be driven from a single executor. The manager
//! gives it one: the monitor lives on a named worker thread and every call
//! on the manager becomes a command on the monitor's queue. Updates can be
//! consumed through ordinary subscriber callbacks, a tokio broadcast
//! channel, or a blocking iterator.
//!
//! ## Key Features
//!
//! - **Sync-First API**: All methods are synchronous - no async/await required
//! - **Ordered Commands**: Commands queue behind pending source events
//! - **Reentrant-Safe Handle**: Callbacks may queue `dispatch_state()` without recursion
//! - **Broadcast Updates**: Serializable `MonitorUpdate` values for channel consumers
//! - **Snapshot**: Latest now-playing pair available at any time
//!
//! ## Usage
//!
//! ```rust,ignore
//! use media_session_manager::SessionMonitorManager;
//!
//! let manager = SessionMonitorManager::new(host_source)?;
//! let mut updates = manager.iter();
//!
//! // Ask for the current state: one metadata and one playback update
//! manager.dispatch_state()?;
//!
//! // Blocking receive; the iterator itself only ends once the manager is gone
//! for update in updates.by_ref().take(2) {
//!     println!("Update: {:?}", update);
//! }
//!
//! manager.release()?;
//! ```

pub mod error;
pub mod iter;
pub mod manager;
pub mod update;
pub mod worker;

// Re-export main types for convenience
pub use error::{ManagerError, Result};
pub use iter::UpdateIterator;
pub use manager::{MonitorHandle, SessionMonitorManager};
pub use update::{BroadcastBridge, MonitorUpdate, NowPlaying};

// Re-export commonly used types from dependencies
pub use media_session_state::{
    CallbackResult, EventSource, MonitorCallback, MonitorConfig, PackageName, PlaybackState,
    PlaybackStatus, SessionToken, SubscriberId, TrackMetadata,
};

/// Prelude module for convenient imports
///
/// ```rust
/// use media_session_manager::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallbackResult, ManagerError, MonitorCallback, MonitorConfig, MonitorHandle,
        MonitorUpdate, NowPlaying, PlaybackState, Result, SessionMonitorManager, SubscriberId,
        TrackMetadata, UpdateIterator,
    };
}
