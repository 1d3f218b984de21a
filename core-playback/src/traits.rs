//! # Core Playback Traits
//!
//! Abstractions the engine is generic over that belong to the core rather
//! than to the host. Host-provided capabilities (transport, output device,
//! bundle) live in `bridge-traits`.

use crate::error::Result;
use crate::types::Track;
use async_trait::async_trait;
use bridge_traits::Locator;

/// Turns a [`Track`] into something the transport can open.
///
/// Resolution runs off the coordination context, alongside opening the
/// transport, so implementations may perform I/O.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve the track's locator.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidSource`](crate::PlaybackError::InvalidSource)
    /// when the track cannot be located.
    async fn resolve(&self, track: &Track) -> Result<Locator>;
}
