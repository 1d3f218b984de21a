//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management (host bridge injection)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the playback core depends on.
//! It establishes the logging conventions, the fail-fast bridge
//! configuration, and the event broadcasting mechanism used throughout the
//! workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
