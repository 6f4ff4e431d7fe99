//! Fan-out of monitor notifications to subscriber callbacks
//!
//! Subscribers are invoked synchronously, in registration order. A callback
//! that returns an error or panics is logged and skipped; the remaining
//! callbacks still run and the failure never reaches the event source.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{PackageName, PlaybackState, TrackMetadata};

/// Error type subscribers may return from a notification
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one subscriber notification
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Consumer of the active session's metadata and playback state
///
/// # Example
///
/// ```rust
/// use media_session_state::{CallbackResult, MonitorCallback, PackageName, PlaybackState, TrackMetadata};
///
/// struct NowPlayingLabel(String);
///
/// impl MonitorCallback for NowPlayingLabel {
///     fn on_metadata_changed(
///         &mut self,
///         _package: Option<&PackageName>,
///         metadata: Option<&TrackMetadata>,
///     ) -> CallbackResult {
///         self.0 = metadata.map(|m| m.description()).unwrap_or_default();
///         Ok(())
///     }
///
///     fn on_playback_state_changed(&mut self, _state: Option<&PlaybackState>) -> CallbackResult {
///         Ok(())
///     }
/// }
/// ```
pub trait MonitorCallback: Send {
    /// The active session changed or published new metadata
    ///
    /// Both values are `None` when no session is active.
    fn on_metadata_changed(
        &mut self,
        package: Option<&PackageName>,
        metadata: Option<&TrackMetadata>,
    ) -> CallbackResult;

    /// Playback state of the active session, delivered on every cycle
    fn on_playback_state_changed(&mut self, state: Option<&PlaybackState>) -> CallbackResult;
}

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle identifying one registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocate a process-wide unique id
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Ordered collection of subscriber callbacks
#[derive(Default)]
pub struct Dispatcher {
    subscribers: Vec<(SubscriberId, Box<dyn MonitorCallback>)>,
    fault_count: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback at the end of the notification order
    pub fn subscribe(&mut self, callback: Box<dyn MonitorCallback>) -> SubscriberId {
        let id = SubscriberId::next();
        self.insert(id, callback);
        id
    }

    /// Register a callback under an id allocated by the caller
    ///
    /// An existing registration with the same id is replaced in place;
    /// returns whether that happened.
    pub fn insert(&mut self, id: SubscriberId, callback: Box<dyn MonitorCallback>) -> bool {
        match self.subscribers.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => {
                tracing::warn!(subscriber = %id, "Subscriber id already registered, replacing callback");
                slot.1 = callback;
                true
            }
            None => {
                self.subscribers.push((id, callback));
                false
            }
        }
    }

    /// Remove a callback, returning whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn notify_metadata_changed(
        &mut self,
        package: Option<&PackageName>,
        metadata: Option<&TrackMetadata>,
    ) {
        for (id, callback) in self.subscribers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callback.on_metadata_changed(package, metadata)
            }));
            if report_fault(*id, "on_metadata_changed", outcome) {
                self.fault_count += 1;
            }
        }
    }

    pub fn notify_playback_state_changed(&mut self, state: Option<&PlaybackState>) {
        for (id, callback) in self.subscribers.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callback.on_playback_state_changed(state)
            }));
            if report_fault(*id, "on_playback_state_changed", outcome) {
                self.fault_count += 1;
            }
        }
    }

    /// Drop every callback
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Number of notifications that failed since creation
    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscriber_count", &self.subscribers.len())
            .field("fault_count", &self.fault_count)
            .finish()
    }
}

/// Log a failed notification; returns true if it failed
fn report_fault(
    id: SubscriberId,
    method: &'static str,
    outcome: std::thread::Result<CallbackResult>,
) -> bool {
    match outcome {
        Ok(Ok(())) => false,
        Ok(Err(err)) => {
            tracing::warn!(subscriber = %id, "Error from {}: {}", method, err);
            true
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(subscriber = %id, "Panic in {}: {}", method, message);
            true
        }
    }
}
