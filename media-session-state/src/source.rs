//! Seam between the monitor and the host media framework
//!
//! The host layer (session manager bindings, controller callbacks) lives
//! outside this crate. It implements [`EventSource`] and pushes every change
//! through the [`EventSink`] it was handed, which feeds the monitor's single
//! event queue.
//!
//! ```text
//! host framework ──► EventSource ──► EventSink ──► queue ──► MetadataMonitor
//!                    (pull: live_sessions, initial_state)
//! ```

use std::fmt;
use std::sync::mpsc;

use crate::error::SourceError;
use crate::model::{PackageName, PlaybackState, SessionToken, TrackMetadata};
use crate::queue::Message;

/// Registration handle returned by an event source for a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// One entry of the host's live session list
#[derive(Debug, Clone)]
pub struct LiveSession<C> {
    pub token: SessionToken,
    pub package: PackageName,
    /// Host handle used to pull state and register for pushes
    pub controller: C,
}

impl<C> LiveSession<C> {
    pub fn new(token: impl Into<SessionToken>, package: impl Into<PackageName>, controller: C) -> Self {
        Self {
            token: token.into(),
            package: package.into(),
            controller,
        }
    }
}

/// State pulled eagerly from a controller when its session is first tracked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialState {
    pub playback_state: Option<PlaybackState>,
    pub metadata: Option<TrackMetadata>,
}

impl InitialState {
    pub fn new(playback_state: Option<PlaybackState>, metadata: Option<TrackMetadata>) -> Self {
        Self {
            playback_state,
            metadata,
        }
    }
}

/// Change pushed by the host
#[derive(Debug, Clone)]
pub enum SourceEvent<C> {
    /// Full replacement of the live session list
    ActiveSessionsChanged(Vec<LiveSession<C>>),

    /// A session's playback state changed
    PlaybackStateChanged {
        token: SessionToken,
        state: PlaybackState,
    },

    /// A session's metadata changed (`None` means the session cleared it)
    MetadataChanged {
        token: SessionToken,
        metadata: Option<TrackMetadata>,
    },
}

/// Capability handed to an event source for delivering changes
///
/// Every method returns `false` once the monitor owning the queue is gone,
/// which tells the source it can drop its host registration.
pub struct EventSink<C> {
    tx: mpsc::Sender<Message<C>>,
}

impl<C> EventSink<C> {
    pub(crate) fn new(tx: mpsc::Sender<Message<C>>) -> Self {
        Self { tx }
    }

    pub fn active_sessions_changed(&self, sessions: Vec<LiveSession<C>>) -> bool {
        self.send(SourceEvent::ActiveSessionsChanged(sessions))
    }

    pub fn playback_state_changed(&self, token: SessionToken, state: PlaybackState) -> bool {
        self.send(SourceEvent::PlaybackStateChanged { token, state })
    }

    pub fn metadata_changed(&self, token: SessionToken, metadata: Option<TrackMetadata>) -> bool {
        self.send(SourceEvent::MetadataChanged { token, metadata })
    }

    pub fn send(&self, event: SourceEvent<C>) -> bool {
        self.tx.send(Message::Source(event)).is_ok()
    }
}

impl<C> Clone for EventSink<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C> fmt::Debug for EventSink<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

/// Host media framework as seen by the monitor
///
/// Implementations wrap the platform's session manager. All methods are
/// called from the monitor's executor, one at a time.
pub trait EventSource {
    /// Per-session handle (the host's controller object)
    type Controller;

    /// Snapshot of the sessions that are live right now
    fn live_sessions(&self) -> Result<Vec<LiveSession<Self::Controller>>, SourceError>;

    /// Register for full-replace notifications of the live session list
    fn watch_active_sessions(
        &mut self,
        sink: EventSink<Self::Controller>,
    ) -> Result<WatchId, SourceError>;

    /// Pull the current playback state and metadata of a controller
    fn initial_state(&self, controller: &Self::Controller) -> InitialState;

    /// Register for incremental state and metadata pushes of one session
    fn watch_session(
        &mut self,
        controller: &Self::Controller,
        token: &SessionToken,
        sink: EventSink<Self::Controller>,
    ) -> Result<WatchId, SourceError>;

    /// Drop a registration made by either watch method
    fn unwatch(&mut self, watch: WatchId);
}
