//! Per-session record kept by the registry

use crate::model::{PackageName, PlaybackState, SessionToken, TrackMetadata};
use crate::source::{InitialState, WatchId};

/// Last known state of one tracked session
#[derive(Debug, Clone)]
pub struct SessionState<C> {
    token: SessionToken,
    package: PackageName,
    controller: C,
    /// Distinguishes this record from an earlier one under the same token
    generation: u64,
    watch: Option<WatchId>,
    playback_state: Option<PlaybackState>,
    metadata: Option<TrackMetadata>,
    /// Metadata changed since it was last handed to the dispatcher
    has_unseen_metadata: bool,
}

impl<C> SessionState<C> {
    /// Create a record from eagerly pulled state; its metadata starts unseen
    pub(crate) fn new(
        token: SessionToken,
        package: PackageName,
        controller: C,
        generation: u64,
        initial: InitialState,
        watch: Option<WatchId>,
    ) -> Self {
        Self {
            token,
            package,
            controller,
            generation,
            watch,
            playback_state: initial.playback_state,
            metadata: initial.metadata,
            has_unseen_metadata: true,
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn package(&self) -> &PackageName {
        &self.package
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Source registration delivering this session's pushes, if any
    pub fn watch(&self) -> Option<WatchId> {
        self.watch
    }

    pub(crate) fn take_watch(&mut self) -> Option<WatchId> {
        self.watch.take()
    }

    pub fn playback_state(&self) -> Option<&PlaybackState> {
        self.playback_state.as_ref()
    }

    pub fn metadata(&self) -> Option<&TrackMetadata> {
        self.metadata.as_ref()
    }

    pub fn has_unseen_metadata(&self) -> bool {
        self.has_unseen_metadata
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state.as_ref().is_some_and(PlaybackState::is_playing)
    }

    /// Has a playback state other than `None`
    pub fn is_engaged(&self) -> bool {
        self.playback_state.as_ref().is_some_and(|state| !state.is_idle())
    }

    pub fn set_playback_state(&mut self, state: PlaybackState) {
        self.playback_state = Some(state);
    }

    /// Replace metadata and mark it unseen, even if the value is identical
    pub fn set_metadata(&mut self, metadata: Option<TrackMetadata>) {
        self.metadata = metadata;
        self.has_unseen_metadata = true;
    }

    pub(crate) fn mark_metadata_seen(&mut self) {
        self.has_unseen_metadata = false;
    }
}
