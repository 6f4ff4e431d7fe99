//! Track metadata type

use serde::{Deserialize, Serialize};

/// Descriptive metadata published by a session for its current item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,
    /// Artist name
    pub artist: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Album artist
    pub album_artist: Option<String>,
    /// Track duration in milliseconds
    pub duration_ms: Option<u64>,
    /// Artwork reference (URI)
    pub artwork_uri: Option<String>,
    /// URI of the media item
    pub media_uri: Option<String>,
    /// Display subtitle chosen by the session
    pub display_subtitle: Option<String>,
}

impl TrackMetadata {
    /// Create a new empty TrackMetadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Create TrackMetadata with a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn artwork_uri(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }

    pub fn media_uri(mut self, uri: impl Into<String>) -> Self {
        self.media_uri = Some(uri.into());
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Names of the fields that carry a value
    pub fn populated_keys(&self) -> Vec<&'static str> {
        let fields: [(&'static str, bool); 8] = [
            ("title", self.title.is_some()),
            ("artist", self.artist.is_some()),
            ("album", self.album.is_some()),
            ("album_artist", self.album_artist.is_some()),
            ("duration_ms", self.duration_ms.is_some()),
            ("artwork_uri", self.artwork_uri.is_some()),
            ("media_uri", self.media_uri.is_some()),
            ("display_subtitle", self.display_subtitle.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }

    /// Short human readable description, `"title - subtitle"`
    ///
    /// The subtitle falls back to the artist, then the album.
    pub fn description(&self) -> String {
        let subtitle = self
            .display_subtitle
            .as_deref()
            .or(self.artist.as_deref())
            .or(self.album.as_deref());
        match (self.title.as_deref(), subtitle) {
            (Some(title), Some(subtitle)) => format!("{} - {}", title, subtitle),
            (Some(title), None) => title.to_string(),
            (None, Some(subtitle)) => subtitle.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Check if the metadata has any meaningful content
    pub fn is_empty(&self) -> bool {
        self.populated_keys().is_empty()
    }
}
