//! Playback state reported by a media session

use serde::{Deserialize, Serialize};

/// Transport status of a session
///
/// Arbitration only distinguishes `Playing`, `None`, and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// The session has never had anything to play
    None,
    Stopped,
    Paused,
    Playing,
    FastForwarding,
    Rewinding,
    Buffering,
    Error,
    Connecting,
    SkippingToPrevious,
    SkippingToNext,
    SkippingToQueueItem,
}

impl PlaybackStatus {
    /// Parse from a host state name
    ///
    /// Accepts names with or without a `STATE_` prefix, in any case
    /// (`"PLAYING"`, `"state_paused"`, `"skipping_to_next"`). Unknown names
    /// map to `None`.
    pub fn from_state_name(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        let name = upper.strip_prefix("STATE_").unwrap_or(&upper);
        match name {
            "STOPPED" => PlaybackStatus::Stopped,
            "PAUSED" | "PAUSED_PLAYBACK" => PlaybackStatus::Paused,
            "PLAYING" => PlaybackStatus::Playing,
            "FAST_FORWARDING" => PlaybackStatus::FastForwarding,
            "REWINDING" => PlaybackStatus::Rewinding,
            "BUFFERING" => PlaybackStatus::Buffering,
            "ERROR" => PlaybackStatus::Error,
            "CONNECTING" => PlaybackStatus::Connecting,
            "SKIPPING_TO_PREVIOUS" => PlaybackStatus::SkippingToPrevious,
            "SKIPPING_TO_NEXT" => PlaybackStatus::SkippingToNext,
            "SKIPPING_TO_QUEUE_ITEM" => PlaybackStatus::SkippingToQueueItem,
            _ => PlaybackStatus::None,
        }
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        PlaybackStatus::None
    }
}

/// Last playback state pushed by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Playback position in milliseconds, if the session reports one
    pub position_ms: Option<u64>,
    /// Buffered position in milliseconds
    pub buffered_position_ms: Option<u64>,
    /// Playback speed, 1.0 for normal playback
    pub speed: f32,
}

impl PlaybackState {
    pub fn new(status: PlaybackStatus) -> Self {
        Self {
            status,
            position_ms: None,
            buffered_position_ms: None,
            speed: if status == PlaybackStatus::Playing { 1.0 } else { 0.0 },
        }
    }

    pub fn playing() -> Self {
        Self::new(PlaybackStatus::Playing)
    }

    pub fn paused() -> Self {
        Self::new(PlaybackStatus::Paused)
    }

    pub fn stopped() -> Self {
        Self::new(PlaybackStatus::Stopped)
    }

    pub fn none() -> Self {
        Self::new(PlaybackStatus::None)
    }

    pub fn with_position(mut self, position_ms: u64) -> Self {
        self.position_ms = Some(position_ms);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_buffered_position(mut self, buffered_position_ms: u64) -> Self {
        self.buffered_position_ms = Some(buffered_position_ms);
        self
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// True when the session has nothing loaded at all
    pub fn is_idle(&self) -> bool {
        self.status == PlaybackStatus::None
    }
}

impl From<PlaybackStatus> for PlaybackState {
    fn from(status: PlaybackStatus) -> Self {
        PlaybackState::new(status)
    }
}
