//! # Playback Domain Types
//!
//! Tracks, playback states, and the progress derivation shared by the engine
//! and the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use uuid::Uuid;

/// Opaque, unique track identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(Uuid);

impl TrackId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable item.
///
/// Tracks are immutable values built by the catalog. Identity is the `id`:
/// two tracks with the same id are the same track even if their metadata
/// differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    /// URL for remote tracks, bundle-relative name (no extension) for local ones.
    pub locator: String,
    pub is_local: bool,
}

impl Track {
    /// Track streamed from `url`.
    pub fn remote(
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: TrackId::new(),
            title: title.into(),
            artist: artist.into(),
            locator: url.into(),
            is_local: false,
        }
    }

    /// Track shipped in the host bundle under `name`.
    pub fn local(
        title: impl Into<String>,
        artist: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: TrackId::new(),
            title: title.into(),
            artist: artist.into(),
            locator: name.into(),
            is_local: true,
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Why the engine entered [`PlaybackState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The track locator could not be resolved.
    InvalidSource,
    /// The transport could not open the resolved source.
    OpenFailure,
    /// The transport failed to start or failed mid-playback.
    PlaybackFailure,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidSource => "invalid source",
            FailureKind::OpenFailure => "open failure",
            FailureKind::PlaybackFailure => "playback failure",
        };
        f.write_str(name)
    }
}

/// Engine playback state. `Stopped` is both initial and "no session".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Failed(FailureKind),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed(_))
    }
}

/// Fraction of `duration` covered by `current`, in `[0, 1]`.
///
/// Zero when the duration is unknown (zero).
pub fn progress(current: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }
    (current.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

/// Milliseconds for event payloads, saturating.
pub(crate) fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
