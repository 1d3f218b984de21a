//! # Playback Error Types
//!
//! Error types for playback operations.

use crate::types::FailureKind;
use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
///
/// Errors are `Clone` so the same failure can be stored as the engine's last
/// error and returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    // ========================================================================
    // Playback Failures
    // ========================================================================
    /// The track locator could not be resolved to an openable source.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// The transport failed to open the resolved source.
    #[error("Failed to open audio source: {0}")]
    OpenFailure(String),

    /// The transport failed to start or failed while playing.
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    // ========================================================================
    // Platform/Adapter Errors
    // ========================================================================
    /// The output device could not be claimed.
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// A later `play` or a `stop` replaced this request before it completed.
    #[error("Playback request superseded")]
    Superseded,

    /// Playback configuration is invalid.
    #[error("Invalid playback configuration: {0}")]
    Config(String),

    /// The player service is no longer running.
    #[error("Player service stopped")]
    ServiceStopped,
}

impl PlaybackError {
    /// Maps the failure taxonomy onto the state the engine enters.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PlaybackError::InvalidSource(_) => Some(FailureKind::InvalidSource),
            PlaybackError::OpenFailure(_) => Some(FailureKind::OpenFailure),
            PlaybackError::PlaybackFailure(_) => Some(FailureKind::PlaybackFailure),
            _ => None,
        }
    }

    /// Returns `true` if playing the same track again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::OpenFailure(_) | PlaybackError::PlaybackFailure(_)
        )
    }

    pub(crate) fn open_failure(err: BridgeError) -> Self {
        PlaybackError::OpenFailure(err.to_string())
    }

    pub(crate) fn playback_failure(err: BridgeError) -> Self {
        PlaybackError::PlaybackFailure(err.to_string())
    }
}

impl From<core_runtime::Error> for PlaybackError {
    fn from(err: core_runtime::Error) -> Self {
        PlaybackError::Config(err.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
