//! Output device session for desktop.
//!
//! Desktop audio stacks do not arbitrate output between applications the way
//! mobile platforms do, so the session only tracks the claim locally.

use bridge_traits::{error::Result, output::OutputDeviceSession};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Desktop output session.
#[derive(Debug, Default)]
pub struct DesktopOutputSession {
    active: AtomicBool,
}

impl DesktopOutputSession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputDeviceSession for DesktopOutputSession {
    fn activate(&self) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("Output session already active");
        } else {
            info!("Output session activated");
        }
        Ok(())
    }

    fn deactivate(&self) -> Result<()> {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Output session deactivated");
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
