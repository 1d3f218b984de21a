//! # Playback Coordinator
//!
//! Holds what presentation currently sees and keeps it in sync with the
//! engine through two producers:
//!
//! - **push**: the engine's [`EngineSnapshot`] watch channel, mirrored on change
//!   ([`sync_from_engine`](PlaybackCoordinator::sync_from_engine))
//! - **pull**: a fixed-interval monitor that re-reads the live transport time
//!   and resets the player once it runs past the end
//!   ([`on_monitor_tick`](PlaybackCoordinator::on_monitor_tick))
//!
//! Progress is derived on every publish. Observers watch a [`PlayerView`].

use crate::engine::{EngineSnapshot, OpenedSource, PlayRequest, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::types::{as_millis, progress, Track};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable player state for presentation layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerView {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub current_time: Duration,
    pub duration: Duration,
    /// `current_time / duration` in `[0, 1]`, 0 while the duration is unknown.
    pub progress: f64,
    pub last_error: Option<PlaybackError>,
}

/// Owns the engine for its whole lifetime and publishes a [`PlayerView`].
pub struct PlaybackCoordinator {
    engine: PlaybackEngine,
    engine_rx: watch::Receiver<EngineSnapshot>,
    view: watch::Sender<PlayerView>,
}

impl PlaybackCoordinator {
    pub fn new(engine: PlaybackEngine) -> Self {
        let engine_rx = engine.subscribe();
        let (view, _) = watch::channel(PlayerView::default());

        let mut coordinator = Self {
            engine,
            engine_rx,
            view,
        };
        coordinator.sync_from_engine();
        coordinator
    }

    /// Watch the published view. Publishes that change nothing do not notify.
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine {
        &mut self.engine
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Play `track`: see [`PlaybackEngine::play`].
    ///
    /// On success the track becomes current and the view shows it playing.
    /// On failure the error is surfaced in the view and the current track is
    /// left unchanged. A superseded request is not surfaced.
    pub async fn play(&mut self, track: Track) -> Result<()> {
        let request = self.begin_play(track);
        let opened = request.open().await;
        self.finish_play(opened)
    }

    pub fn begin_play(&mut self, track: Track) -> PlayRequest {
        self.engine.begin_play(track)
    }

    pub fn finish_play(&mut self, opened: OpenedSource) -> Result<()> {
        match self.engine.finish_play(opened) {
            Ok(()) => {
                let track = self.engine.current_track().cloned();
                let duration = self.engine.duration();
                self.update_view(|view| {
                    view.current_track = track;
                    view.duration = duration;
                    view.is_playing = true;
                    view.last_error = None;
                });
                Ok(())
            }
            Err(PlaybackError::Superseded) => Err(PlaybackError::Superseded),
            Err(err) => {
                debug!(error = %err, "Play failed");
                // The engine tore the previous session down; current_track is kept.
                self.sync_from_engine();
                let surfaced = err.clone();
                self.update_view(|view| view.last_error = Some(surfaced));
                Err(err)
            }
        }
    }

    /// Pause when the view shows playing, resume otherwise.
    ///
    /// `is_playing` follows the engine; it is not flipped optimistically.
    pub fn toggle_play_pause(&mut self) {
        if self.view.borrow().is_playing {
            self.engine.pause();
        } else {
            self.engine.resume();
        }
        self.sync_from_engine();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.sync_from_engine();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
        self.sync_from_engine();
    }

    /// Seek to `fraction` of the duration, clamped to `[0, 1]` (NaN counts as 0).
    pub fn seek(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let duration = self.view.borrow().duration;
        let target = duration.mul_f64(fraction);

        debug!(fraction, target_ms = as_millis(target), "Seek requested");
        self.engine.seek(target);
        self.sync_from_engine();
    }

    /// Returns the applied volume.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let applied = self.engine.set_volume(volume);
        self.sync_from_engine();
        applied
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.sync_from_engine();
    }

    /// Clear the error surface on both the view and the engine.
    pub fn clear_error(&mut self) {
        self.engine.clear_error();
        self.update_view(|view| view.last_error = None);
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Mirror the engine's published state into the view.
    pub fn sync_from_engine(&mut self) {
        let snapshot = self.engine_rx.borrow_and_update().clone();
        self.update_view(|view| {
            view.is_playing = snapshot.is_playing();
            view.current_time = snapshot.current_time;
            view.duration = snapshot.duration;
            view.last_error = snapshot.last_error;
        });
    }

    /// Resolves when the engine publishes a new snapshot.
    ///
    /// Never resolves once the engine is gone.
    pub async fn engine_changed(&mut self) {
        if self.engine_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Pull the live transport time; reset once it reaches the duration.
    pub fn on_monitor_tick(&mut self) {
        let now = self.engine.live_current_time();
        let duration = self.view.borrow().duration;

        if !duration.is_zero() && now >= duration {
            info!(
                position_ms = as_millis(now),
                duration_ms = as_millis(duration),
                "Monitored time reached end of track"
            );
            self.reset();
            return;
        }

        self.update_view(|view| view.current_time = now);
    }

    /// Pause and rewind, leaving the track loaded.
    fn reset(&mut self) {
        self.engine.pause();
        self.engine.seek(Duration::ZERO);
        if self.engine.state().is_failed() {
            warn!(state = ?self.engine.state(), "Transport failed while resetting");
        }

        self.update_view(|view| {
            view.is_playing = false;
            view.current_time = Duration::ZERO;
        });
    }

    fn update_view(&self, apply: impl FnOnce(&mut PlayerView)) {
        self.view.send_if_modified(|view| {
            let before = view.clone();
            apply(view);
            view.progress = progress(view.current_time, view.duration);
            *view != before
        });
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("engine", &self.engine)
            .field("view", &*self.view.borrow())
            .finish()
    }
}
