//! Channel-friendly view of monitor notifications
//!
//! [`BroadcastBridge`] is an ordinary subscriber that turns every
//! notification into a [`MonitorUpdate`], keeps the latest pair in a
//! [`NowPlaying`] snapshot, and publishes the update on a tokio broadcast
//! channel.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use media_session_state::{
    CallbackResult, MonitorCallback, PackageName, PlaybackState, TrackMetadata,
};

/// One notification delivered by the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorUpdate {
    /// The active session changed or published new metadata
    MetadataChanged {
        package: Option<PackageName>,
        metadata: Option<TrackMetadata>,
    },
    /// Playback state of the active session
    PlaybackStateChanged { state: Option<PlaybackState> },
}

/// Latest metadata and playback state delivered to subscribers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub package: Option<PackageName>,
    pub metadata: Option<TrackMetadata>,
    pub playback_state: Option<PlaybackState>,
}

impl NowPlaying {
    /// True when no session is being presented
    pub fn is_empty(&self) -> bool {
        self.package.is_none() && self.metadata.is_none() && self.playback_state.is_none()
    }

    fn apply(&mut self, update: &MonitorUpdate) {
        match update {
            MonitorUpdate::MetadataChanged { package, metadata } => {
                self.package = package.clone();
                self.metadata = metadata.clone();
            }
            MonitorUpdate::PlaybackStateChanged { state } => {
                self.playback_state = state.clone();
            }
        }
    }
}

/// Subscriber forwarding notifications to a broadcast channel
pub struct BroadcastBridge {
    updates: broadcast::Sender<MonitorUpdate>,
    now_playing: Arc<RwLock<NowPlaying>>,
}

impl BroadcastBridge {
    pub fn new(updates: broadcast::Sender<MonitorUpdate>, now_playing: Arc<RwLock<NowPlaying>>) -> Self {
        Self {
            updates,
            now_playing,
        }
    }

    fn publish(&self, update: MonitorUpdate) {
        self.now_playing.write().apply(&update);
        // No receivers is not an error; the snapshot still tracks the update
        let _ = self.updates.send(update);
    }
}

impl MonitorCallback for BroadcastBridge {
    fn on_metadata_changed(
        &mut self,
        package: Option<&PackageName>,
        metadata: Option<&TrackMetadata>,
    ) -> CallbackResult {
        self.publish(MonitorUpdate::MetadataChanged {
            package: package.cloned(),
            metadata: metadata.cloned(),
        });
        Ok(())
    }

    fn on_playback_state_changed(&mut self, state: Option<&PlaybackState>) -> CallbackResult {
        self.publish(MonitorUpdate::PlaybackStateChanged {
            state: state.cloned(),
        });
        Ok(())
    }
}
