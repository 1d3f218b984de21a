//! Workspace facade crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`bridge-traits`, `core-runtime`, `core-playback`). Host applications
//! can depend on `playback-workspace` and enable the documented features
//! without wiring each crate individually.

#[cfg(feature = "core")]
pub use bridge_traits;
#[cfg(feature = "core")]
pub use core_playback;
#[cfg(feature = "core")]
pub use core_runtime;
