//! Model types for media-session-state

mod id_types;
mod playback_state;
mod track_metadata;

pub use id_types::{PackageName, SessionToken};
pub use playback_state::{PlaybackState, PlaybackStatus};
pub use track_metadata::TrackMetadata;
