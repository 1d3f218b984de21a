//! Media transport bridge traits.
//!
//! A transport is the host mechanism that actually decodes and outputs audio
//! for an opened source (AVPlayer, GStreamer, rodio, a browser `<audio>`
//! element, ...). The core never talks to the platform audio stack directly:
//! it opens a [`Locator`] through [`MediaTransport`] and drives the returned
//! [`TransportHandle`].
//!
//! Transport callbacks may fire on any thread. Implementations simply invoke
//! the registered [`TransportListener`]; the core is responsible for moving
//! the notification onto its own execution context.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// A resolved, openable reference to audio data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Remote stream addressed by URL.
    Remote(Url),
    /// Resource shipped inside the host application's bundle.
    Bundled(PathBuf),
}

impl Locator {
    /// Returns `true` if opening this locator goes over the network.
    pub fn is_remote(&self) -> bool {
        match self {
            Locator::Remote(url) => url.scheme() != "file",
            Locator::Bundled(_) => false,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Remote(url) => write!(f, "{}", url),
            Locator::Bundled(path) => write!(f, "bundle:{}", path.display()),
        }
    }
}

/// Signals raised by an open transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TransportEvent {
    /// Playback reached the end of the media.
    EndOfMedia,
    /// Another audio claim suspended output.
    InterruptionBegan,
    /// The interruption is over. `should_resume` carries the host's hint.
    InterruptionEnded { should_resume: bool },
    /// The transport failed while a session was active.
    Error { message: String },
}

/// Callback registered on a [`TransportHandle`].
pub type TransportListener = Box<dyn Fn(TransportEvent) + Send + Sync>;

/// Opens sources for playback.
///
/// `open` may take arbitrarily long for remote sources; the core never calls
/// it from its coordination context.
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// Open `locator` and return a paused handle positioned at zero.
    async fn open(&self, locator: &Locator) -> Result<Box<dyn TransportHandle>>;
}

/// A live, opened source.
///
/// Dropping a handle must release its platform resources even if
/// [`close`](TransportHandle::close) was never called.
pub trait TransportHandle: Send {
    /// Start or resume output.
    fn play(&mut self) -> Result<()>;

    /// Suspend output, keeping the position.
    fn pause(&mut self) -> Result<()>;

    /// Pause and rewind to the start.
    fn stop(&mut self) -> Result<()> {
        self.pause()?;
        self.seek(Duration::ZERO)
    }

    /// Move to an absolute position.
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Volume is normalized to `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Position the transport is at right now.
    fn current_time(&self) -> Duration;

    /// Media duration, `None` until the transport knows it.
    fn duration(&self) -> Option<Duration>;

    /// Register the listener for this handle's events, replacing any previous one.
    fn subscribe(&mut self, listener: TransportListener);

    /// Remove the registered listener. No events are delivered afterwards.
    fn unsubscribe(&mut self);

    /// Release the transport. Further calls are no-ops.
    fn close(&mut self);
}
