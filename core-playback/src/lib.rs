//! # Playback Core
//!
//! Single-track audio playback driven through host-provided bridges.
//!
//! ## Overview
//!
//! This crate handles:
//! - Resolving tracks to openable locators (remote URL or bundled resource)
//! - The playback state machine ([`PlaybackEngine`]): one live session at a
//!   time, interruptions, end of media, volume
//! - Presentation binding ([`PlaybackCoordinator`]): a [`PlayerView`] kept in
//!   sync with the engine and a fixed-interval monitor
//! - A task-backed service ([`PlayerService`]) driven through a cloneable
//!   [`PlayerHandle`]
//!
//! Audio decoding and output belong to the host's
//! [`MediaTransport`](bridge_traits::MediaTransport).

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod service;
pub mod traits;
pub mod types;

pub use config::PlaybackConfig;
pub use coordinator::{PlaybackCoordinator, PlayerView};
pub use engine::{
    EngineSnapshot, OpenedSource, PlayRequest, PlaybackEngine, SessionEvent, SessionEventKind,
    SessionEvents, SessionGeneration,
};
pub use error::{PlaybackError, Result};
pub use resolver::BundleSourceResolver;
pub use service::{PlayerHandle, PlayerService};
pub use traits::SourceResolver;
pub use types::{progress, FailureKind, PlaybackState, Track, TrackId};
