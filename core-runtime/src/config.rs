//! # Core Configuration Module
//!
//! Collects the host bridges the playback core runs on.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! that holds every bridge the core needs. It enforces fail-fast validation:
//! a missing bridge is reported when the config is built, not when the first
//! track is played.
//!
//! ## Required Dependencies
//!
//! - `MediaTransport` - Always required; there is no default transport
//!
//! ## Dependencies with platform defaults
//!
//! - `OutputDeviceSession` - Output device claim (desktop default: local claim)
//! - `ResourceBundle` - Bundled track lookup (desktop default: data-dir bundle)
//!
//! When the `desktop-shims` feature is enabled, the desktop defaults are
//! injected automatically if not provided. Without it, every bridge must be
//! injected explicitly.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_transport(Arc::new(MyTransport::new()))
//!     .resource_bundle(Arc::new(MyBundle::new("/opt/app/sounds")))
//!     .event_buffer_size(256)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{MediaTransport, OutputDeviceSession, ResourceBundle};
use std::sync::Arc;

/// Upper bound for the event bus buffer.
pub const MAX_EVENT_BUFFER_SIZE: usize = 65_536;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Opens sources into live transport handles (required)
    pub media_transport: Arc<dyn MediaTransport>,

    /// Process-wide output device claim
    pub output_session: Arc<dyn OutputDeviceSession>,

    /// Lookup for tracks shipped with the host application
    pub resource_bundle: Arc<dyn ResourceBundle>,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_transport", &"MediaTransport { ... }")
            .field("output_session", &"OutputDeviceSession { ... }")
            .field("resource_bundle", &"ResourceBundle { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

fn media_transport_missing_error() -> Error {
    Error::capability_missing(
        "MediaTransport",
        "MediaTransport implementation is required to open and play sources. \
         Desktop: inject a transport backed by the host audio stack (GStreamer, rodio, ...). \
         Mobile: wrap AVPlayer/ExoPlayer. \
         Web: wrap an HTMLAudioElement.",
    )
}

#[cfg(feature = "desktop-shims")]
fn provide_default_output_session() -> Result<Arc<dyn OutputDeviceSession>> {
    use bridge_desktop::DesktopOutputSession;

    let session: Arc<dyn OutputDeviceSession> = Arc::new(DesktopOutputSession::new());
    Ok(session)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_output_session() -> Result<Arc<dyn OutputDeviceSession>> {
    Err(Error::capability_missing(
        "OutputDeviceSession",
        "OutputDeviceSession implementation is required to claim the audio output. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopOutputSession. \
         Mobile: inject the platform audio session (AVAudioSession/AudioManager focus).",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_resource_bundle() -> Result<Arc<dyn ResourceBundle>> {
    use bridge_desktop::DirectoryBundle;

    let bundle: Arc<dyn ResourceBundle> = Arc::new(DirectoryBundle::default_location());
    Ok(bundle)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_resource_bundle() -> Result<Arc<dyn ResourceBundle>> {
    Err(Error::capability_missing(
        "ResourceBundle",
        "ResourceBundle implementation is required to play local tracks. \
         Desktop: ensure the 'desktop-shims' feature is enabled to use the default DirectoryBundle. \
         Mobile: inject a lookup over the application bundle.",
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) once every required bridge is set.
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_transport: Option<Arc<dyn MediaTransport>>,
    output_session: Option<Arc<dyn OutputDeviceSession>>,
    resource_bundle: Option<Arc<dyn ResourceBundle>>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    pub fn media_transport(mut self, transport: Arc<dyn MediaTransport>) -> Self {
        self.media_transport = Some(transport);
        self
    }

    pub fn output_session(mut self, session: Arc<dyn OutputDeviceSession>) -> Self {
        self.output_session = Some(session);
        self
    }

    pub fn resource_bundle(mut self, bundle: Arc<dyn ResourceBundle>) -> Self {
        self.resource_bundle = Some(bundle);
        self
    }

    /// Sets the per-subscriber event buffer (default: [`DEFAULT_EVENT_BUFFER_SIZE`]).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge has no implementation
    /// - [`Error::Config`] when a setting is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let media_transport = self
            .media_transport
            .ok_or_else(media_transport_missing_error)?;

        let output_session = match self.output_session {
            Some(session) => session,
            None => provide_default_output_session()?,
        };

        let resource_bundle = match self.resource_bundle {
            Some(bundle) => bundle,
            None => provide_default_resource_bundle()?,
        };

        let config = CoreConfig {
            media_transport,
            output_session,
            resource_bundle,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
