//! # Playback Configuration
//!
//! Cadences and defaults for the playback engine and its coordinator.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback configuration.
///
/// Every field has a serde default, so a partial document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often the coordinator pulls the live transport time and checks
    /// for end of track.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: Duration,

    /// How often the engine samples the transport while a session is live.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_sample_interval")]
    pub sample_interval: Duration,

    /// File extension appended to local track names when looking them up in
    /// the bundle.
    ///
    /// Default: `"mp3"`.
    #[serde(default = "default_local_extension")]
    pub local_extension: String,

    /// Volume applied to the first session, in `[0.0, 1.0]`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            monitor_interval: default_monitor_interval(),
            sample_interval: default_sample_interval(),
            local_extension: default_local_extension(),
            initial_volume: default_initial_volume(),
        }
    }
}

impl PlaybackConfig {
    /// Tighter cadences for UIs that render a scrubbing position.
    ///
    /// - Monitor every 50 ms
    /// - Sample every 100 ms
    pub fn responsive() -> Self {
        Self {
            monitor_interval: Duration::from_millis(50),
            sample_interval: Duration::from_millis(100),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.monitor_interval.is_zero() {
            return Err(PlaybackError::Config(
                "monitor_interval must be > 0".to_string(),
            ));
        }

        if self.sample_interval.is_zero() {
            return Err(PlaybackError::Config(
                "sample_interval must be > 0".to_string(),
            ));
        }

        let extension = self.local_extension.trim();
        if extension.is_empty() || extension.starts_with('.') || extension.contains(['/', '\\'])
        {
            return Err(PlaybackError::Config(format!(
                "local_extension must be a bare extension, got {:?}",
                self.local_extension
            )));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(
                "initial_volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_monitor_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_sample_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_local_extension() -> String {
    "mp3".to_string()
}

fn default_initial_volume() -> f32 {
    1.0
}
