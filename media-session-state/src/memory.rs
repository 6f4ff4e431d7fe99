//! In-process event source driven by method calls
//!
//! `InMemorySource` implements [`EventSource`] without any host framework.
//! Clones share state, so a test can hand one clone to a monitor and use
//! another to add sessions and push changes.
//!
//! ```rust
//! use media_session_state::memory::InMemorySource;
//! use media_session_state::{MetadataMonitor, MonitorConfig, PlaybackState};
//!
//! let source = InMemorySource::new();
//! let mut monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();
//!
//! source.add_session("token-1", "com.example.player", Some(PlaybackState::playing()), None);
//! monitor.process_pending();
//!
//! assert_eq!(monitor.active_token().map(|t| t.as_str()), Some("token-1"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SourceError;
use crate::model::{PackageName, PlaybackState, SessionToken, TrackMetadata};
use crate::source::{EventSink, EventSource, InitialState, LiveSession, WatchId};

/// Controller handle of an in-memory session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryController {
    pub token: SessionToken,
}

#[derive(Debug, Clone)]
struct MemorySession {
    package: PackageName,
    state: InitialState,
}

#[derive(Debug, Default)]
struct Inner {
    /// Live order as published
    order: Vec<SessionToken>,
    sessions: HashMap<SessionToken, MemorySession>,
    list_watches: HashMap<WatchId, EventSink<MemoryController>>,
    session_watches: HashMap<WatchId, (SessionToken, EventSink<MemoryController>)>,
    next_watch: u64,
    unavailable: Option<String>,
    unwatchable: HashSet<SessionToken>,
    unwatch_calls: usize,
}

impl Inner {
    fn live(&self) -> Vec<LiveSession<MemoryController>> {
        self.order
            .iter()
            .filter_map(|token| {
                self.sessions.get(token).map(|session| LiveSession {
                    token: token.clone(),
                    package: session.package.clone(),
                    controller: MemoryController {
                        token: token.clone(),
                    },
                })
            })
            .collect()
    }

    fn publish_live(&self) {
        let live = self.live();
        for sink in self.list_watches.values() {
            sink.active_sessions_changed(live.clone());
        }
    }

    fn session_sinks(&self, token: &SessionToken) -> impl Iterator<Item = &EventSink<MemoryController>> {
        let token = token.clone();
        self.session_watches
            .values()
            .filter(move |(watched, _)| *watched == token)
            .map(|(_, sink)| sink)
    }

    fn allocate_watch(&mut self) -> WatchId {
        self.next_watch += 1;
        WatchId::new(self.next_watch)
    }
}

/// Event source whose sessions are added and changed by method calls
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that refuses every registration, like a missing host service
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let source = Self::new();
        source.inner.lock().unavailable = Some(reason.into());
        source
    }

    /// Make the source (un)reachable for future registrations
    pub fn set_available(&self, available: bool) {
        let mut inner = self.inner.lock();
        inner.unavailable = if available {
            None
        } else {
            Some("media session service not running".to_string())
        };
    }

    /// Add a live session and publish the new live list
    pub fn add_session(
        &self,
        token: impl Into<SessionToken>,
        package: impl Into<PackageName>,
        playback_state: Option<PlaybackState>,
        metadata: Option<TrackMetadata>,
    ) {
        let mut inner = self.inner.lock();
        Self::stage(&mut inner, token.into(), package.into(), playback_state, metadata);
        inner.publish_live();
    }

    /// Add a live session without publishing the live list
    pub fn stage_session(
        &self,
        token: impl Into<SessionToken>,
        package: impl Into<PackageName>,
        playback_state: Option<PlaybackState>,
        metadata: Option<TrackMetadata>,
    ) {
        let mut inner = self.inner.lock();
        Self::stage(&mut inner, token.into(), package.into(), playback_state, metadata);
    }

    fn stage(
        inner: &mut Inner,
        token: SessionToken,
        package: PackageName,
        playback_state: Option<PlaybackState>,
        metadata: Option<TrackMetadata>,
    ) {
        if !inner.sessions.contains_key(&token) {
            inner.order.push(token.clone());
        }
        inner.sessions.insert(
            token,
            MemorySession {
                package,
                state: InitialState::new(playback_state, metadata),
            },
        );
    }

    /// Remove a live session and publish the new live list
    pub fn remove_session(&self, token: &SessionToken) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.sessions.remove(token).is_some();
        inner.order.retain(|existing| existing != token);
        if removed {
            inner.publish_live();
        }
        removed
    }

    /// Publish the current live list to every list watcher
    pub fn publish_active_sessions(&self) {
        self.inner.lock().publish_live();
    }

    /// Update a session's playback state and push it to its watchers
    pub fn set_playback_state(&self, token: &SessionToken, state: PlaybackState) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.get_mut(token) {
            session.state.playback_state = Some(state.clone());
        }
        for sink in inner.session_sinks(token) {
            sink.playback_state_changed(token.clone(), state.clone());
        }
    }

    /// Update a session's metadata and push it to its watchers
    pub fn set_metadata(&self, token: &SessionToken, metadata: Option<TrackMetadata>) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.get_mut(token) {
            session.state.metadata = metadata.clone();
        }
        for sink in inner.session_sinks(token) {
            sink.metadata_changed(token.clone(), metadata.clone());
        }
    }

    /// Make `watch_session` fail for this token
    pub fn refuse_session_watch(&self, token: impl Into<SessionToken>) {
        self.inner.lock().unwatchable.insert(token.into());
    }

    /// Snapshot of the live list, as `live_sessions` would return it
    pub fn live_snapshot(&self) -> Vec<LiveSession<MemoryController>> {
        self.inner.lock().live()
    }

    /// Outstanding live-list registrations
    pub fn list_watch_count(&self) -> usize {
        self.inner.lock().list_watches.len()
    }

    /// Outstanding per-session registrations
    pub fn session_watch_count(&self) -> usize {
        self.inner.lock().session_watches.len()
    }

    /// Number of times `unwatch` was called
    pub fn unwatch_calls(&self) -> usize {
        self.inner.lock().unwatch_calls
    }
}

impl EventSource for InMemorySource {
    type Controller = MemoryController;

    fn live_sessions(&self) -> Result<Vec<LiveSession<MemoryController>>, SourceError> {
        let inner = self.inner.lock();
        if let Some(reason) = &inner.unavailable {
            return Err(SourceError::Unavailable(reason.clone()));
        }
        Ok(inner.live())
    }

    fn watch_active_sessions(
        &mut self,
        sink: EventSink<MemoryController>,
    ) -> Result<WatchId, SourceError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.unavailable {
            return Err(SourceError::Unavailable(reason.clone()));
        }
        let watch = inner.allocate_watch();
        inner.list_watches.insert(watch, sink);
        Ok(watch)
    }

    fn initial_state(&self, controller: &MemoryController) -> InitialState {
        self.inner
            .lock()
            .sessions
            .get(&controller.token)
            .map(|session| session.state.clone())
            .unwrap_or_default()
    }

    fn watch_session(
        &mut self,
        controller: &MemoryController,
        token: &SessionToken,
        sink: EventSink<MemoryController>,
    ) -> Result<WatchId, SourceError> {
        let mut inner = self.inner.lock();
        if inner.unwatchable.contains(token) || !inner.sessions.contains_key(&controller.token) {
            return Err(SourceError::ControllerUnreachable(token.to_string()));
        }
        let watch = inner.allocate_watch();
        inner.session_watches.insert(watch, (token.clone(), sink));
        Ok(watch)
    }

    fn unwatch(&mut self, watch: WatchId) {
        let mut inner = self.inner.lock();
        inner.unwatch_calls += 1;
        inner.list_watches.remove(&watch);
        inner.session_watches.remove(&watch);
    }
}
