//! Shared helpers for monitor integration tests

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use media_session_state::memory::InMemorySource;
use media_session_state::{
    CallbackResult, MetadataMonitor, MonitorCallback, MonitorConfig, PackageName, PlaybackState,
    PlaybackStatus, TrackMetadata,
};

/// One notification as seen by a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    /// Package and title of a metadata notification
    Metadata(Option<String>, Option<String>),
    /// Status of a playback state notification
    Playback(Option<PlaybackStatus>),
}

impl Note {
    pub fn metadata(package: &str, title: &str) -> Self {
        Note::Metadata(Some(package.to_string()), Some(title.to_string()))
    }

    pub fn cleared() -> Self {
        Note::Metadata(None, None)
    }

    pub fn playback(status: PlaybackStatus) -> Self {
        Note::Playback(Some(status))
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, Note::Metadata(..))
    }
}

pub type Notes = Arc<Mutex<Vec<Note>>>;

/// Records every notification it receives
pub struct Recorder {
    notes: Notes,
}

impl Recorder {
    pub fn new() -> (Box<dyn MonitorCallback>, Notes) {
        let notes = Notes::default();
        (
            Box::new(Recorder {
                notes: Arc::clone(&notes),
            }),
            notes,
        )
    }
}

impl MonitorCallback for Recorder {
    fn on_metadata_changed(
        &mut self,
        package: Option<&PackageName>,
        metadata: Option<&TrackMetadata>,
    ) -> CallbackResult {
        self.notes.lock().push(Note::Metadata(
            package.map(|p| p.to_string()),
            metadata.and_then(|m| m.title.clone()),
        ));
        Ok(())
    }

    fn on_playback_state_changed(&mut self, state: Option<&PlaybackState>) -> CallbackResult {
        self.notes.lock().push(Note::Playback(state.map(|s| s.status)));
        Ok(())
    }
}

/// Panics on metadata, errors on playback state
pub struct Faulty;

impl MonitorCallback for Faulty {
    fn on_metadata_changed(
        &mut self,
        _package: Option<&PackageName>,
        _metadata: Option<&TrackMetadata>,
    ) -> CallbackResult {
        panic!("subscriber blew up");
    }

    fn on_playback_state_changed(&mut self, _state: Option<&PlaybackState>) -> CallbackResult {
        Err("subscriber refused update".into())
    }
}

/// Take every recorded note, leaving the log empty
pub fn take(notes: &Notes) -> Vec<Note> {
    std::mem::take(&mut *notes.lock())
}

pub fn song(title: &str) -> Option<TrackMetadata> {
    Some(TrackMetadata::with_title(title))
}

/// Fresh source plus a monitor with one recording subscriber
pub fn monitor_with_recorder(
    config: MonitorConfig,
) -> (InMemorySource, MetadataMonitor<InMemorySource>, Notes) {
    let source = InMemorySource::new();
    let mut monitor = MetadataMonitor::new(source.clone(), config).unwrap();
    let (recorder, notes) = Recorder::new();
    monitor.subscribe(recorder).unwrap();
    (source, monitor, notes)
}
