//! Audio output device session.
//!
//! The output device is a process-wide resource (an `AVAudioSession`, a PulseAudio
//! stream claim, an `AudioContext`). The core activates it once when its engine
//! starts and deactivates it once on teardown; hosts implement the claim here.

use crate::error::Result;

/// Process-wide audio output claim.
///
/// Implementations must tolerate `deactivate` without a prior successful
/// `activate`.
pub trait OutputDeviceSession: Send + Sync {
    /// Claim the output device for playback.
    fn activate(&self) -> Result<()>;

    /// Release the claim.
    fn deactivate(&self) -> Result<()>;

    /// Whether the claim is currently held.
    fn is_active(&self) -> bool;
}
