//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform-specific audio stack. Each trait represents a capability the core
//! requires but that is implemented differently per platform (desktop, iOS,
//! Android, web).
//!
//! ## Traits
//!
//! - [`MediaTransport`](transport::MediaTransport) - Open a [`Locator`](transport::Locator)
//!   into a live [`TransportHandle`](transport::TransportHandle)
//! - [`OutputDeviceSession`](output::OutputDeviceSession) - Process-wide audio output claim
//! - [`ResourceBundle`](bundle::ResourceBundle) - Lookup of resources shipped with the host
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | Output session + bundle |
//! | iOS      | TBD                 | Planned |
//! | Android  | TBD                 | Planned |
//!
//! No default transport ships with the core. Hosts inject one through
//! `core_runtime::config::CoreConfig`, which fails fast when it is missing.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable
//! (include the locator or resource name).
//!
//! ## Thread Safety
//!
//! Transports, bundles and output sessions are shared across tasks and must be
//! `Send + Sync`. A [`TransportHandle`](transport::TransportHandle) is owned by
//! exactly one engine and only needs to be `Send`.

pub mod bundle;
pub mod error;
pub mod output;
pub mod transport;

pub use error::BridgeError;

pub use bundle::ResourceBundle;
pub use output::OutputDeviceSession;
pub use transport::{Locator, MediaTransport, TransportEvent, TransportHandle, TransportListener};
