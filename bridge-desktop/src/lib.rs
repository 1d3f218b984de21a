//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides the desktop defaults the core falls back to when a
//! host does not inject its own:
//! - `ResourceBundle` using a directory under the platform data dir (`tokio::fs`)
//! - `OutputDeviceSession` as a local claim (desktop does not arbitrate output)
//!
//! There is no desktop `MediaTransport`: decoding and output are always
//! provided by the host.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopOutputSession, DirectoryBundle};
//! use std::sync::Arc;
//!
//! let bundle = Arc::new(DirectoryBundle::new("/opt/player/sounds"));
//! let output = Arc::new(DesktopOutputSession::new());
//!
//! // Use in core configuration
//! ```

mod bundle;
mod output;

pub use bundle::DirectoryBundle;
pub use output::DesktopOutputSession;
