//! # Playback Engine
//!
//! Owns the single active playback session and mediates every state
//! transition: play, pause, resume, stop, seek, and volume.
//!
//! ## Sessions and generations
//!
//! Each `play` request is tagged with a fresh [`SessionGeneration`]. The
//! transport listener and the position sampler of a session stamp everything
//! they send with that generation, and the engine drops anything that does
//! not match the live session. A completed open that no longer matches the
//! latest request is closed on arrival.
//!
//! ## Threading
//!
//! The engine is not shared. It lives on a single coordination task; work
//! that happens elsewhere reaches it as [`SessionEvent`]s through the channel
//! returned by [`PlaybackEngine::new`], and as [`OpenedSource`]s produced by
//! [`PlayRequest::open`]. Operations that start a session spawn the sampler
//! and must run inside a Tokio runtime.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::traits::SourceResolver;
use crate::types::{as_millis, progress, FailureKind, PlaybackState, Track, TrackId};
use bridge_traits::{MediaTransport, OutputDeviceSession, TransportEvent, TransportHandle};
use core_runtime::events::{CoreEvent, EventBus, OutputEvent, PlaybackEvent};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Monotonic id of one play request and the session it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionGeneration(u64);

impl SessionGeneration {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened to a session outside the coordination context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub generation: SessionGeneration,
    pub kind: SessionEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    /// Periodic sampler tick.
    Sample,
    /// Notification from the transport listener.
    Transport(TransportEvent),
}

/// Receiving end of the engine's session events.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Published engine state.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub state: PlaybackState,
    pub current_time: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub last_error: Option<PlaybackError>,
}

impl EngineSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }
}

/// The live binding between an opened source and the engine.
struct PlaybackSession {
    generation: SessionGeneration,
    track: Track,
    handle: Box<dyn TransportHandle>,
    current_time: Duration,
    duration: Duration,
    sampler: CancellationToken,
}

/// A play request waiting for its source to open.
///
/// Produced by [`PlaybackEngine::begin_play`]. Opening does not touch the
/// engine, so it can run on any task.
pub struct PlayRequest {
    generation: SessionGeneration,
    track: Track,
    resolver: Arc<dyn SourceResolver>,
    transport: Arc<dyn MediaTransport>,
}

impl PlayRequest {
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Resolve the track and open it on the transport.
    pub async fn open(self) -> OpenedSource {
        let result = match self.resolver.resolve(&self.track).await {
            Ok(locator) => {
                debug!(
                    track_id = %self.track.id,
                    generation = %self.generation,
                    remote = locator.is_remote(),
                    "Opening source"
                );
                self.transport
                    .open(&locator)
                    .await
                    .map_err(PlaybackError::open_failure)
            }
            Err(err) => Err(err),
        };

        OpenedSource {
            generation: self.generation,
            track: self.track,
            result,
        }
    }
}

impl fmt::Debug for PlayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayRequest")
            .field("generation", &self.generation)
            .field("track_id", &self.track.id)
            .finish()
    }
}

/// Outcome of [`PlayRequest::open`], handed back to [`PlaybackEngine::finish_play`].
pub struct OpenedSource {
    generation: SessionGeneration,
    track: Track,
    result: Result<Box<dyn TransportHandle>>,
}

impl OpenedSource {
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }
}

impl fmt::Debug for OpenedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedSource")
            .field("generation", &self.generation)
            .field("track_id", &self.track.id)
            .field("opened", &self.result.is_ok())
            .finish()
    }
}

/// The playback state machine.
pub struct PlaybackEngine {
    transport: Arc<dyn MediaTransport>,
    resolver: Arc<dyn SourceResolver>,
    output: Arc<dyn OutputDeviceSession>,
    events: EventBus,
    config: PlaybackConfig,
    session: Option<PlaybackSession>,
    state: PlaybackState,
    pending: Option<SessionGeneration>,
    next_generation: u64,
    volume: f32,
    interrupted: bool,
    last_error: Option<PlaybackError>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Sender<EngineSnapshot>,
}

impl PlaybackEngine {
    /// Create an engine and claim the output device.
    ///
    /// Returns the engine together with the receiver its sessions report on.
    /// The caller must feed every received event back through
    /// [`handle_event`](Self::handle_event).
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Config`] if `config` does not validate
    /// - [`PlaybackError::OutputUnavailable`] if the output device cannot be claimed
    pub fn new(
        transport: Arc<dyn MediaTransport>,
        resolver: Arc<dyn SourceResolver>,
        output: Arc<dyn OutputDeviceSession>,
        events: EventBus,
        config: PlaybackConfig,
    ) -> Result<(Self, SessionEvents)> {
        config.validate()?;

        output
            .activate()
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
        info!("Output device activated");
        events.emit(CoreEvent::Output(OutputEvent::Activated)).ok();

        let volume = config.initial_volume;
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(EngineSnapshot {
            state: PlaybackState::Stopped,
            current_time: Duration::ZERO,
            duration: Duration::ZERO,
            volume,
            last_error: None,
        });

        let engine = Self {
            transport,
            resolver,
            output,
            events,
            config,
            session: None,
            state: PlaybackState::Stopped,
            pending: None,
            next_generation: 0,
            volume,
            interrupted: false,
            last_error: None,
            session_tx,
            snapshot,
        };

        Ok((engine, session_rx))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Play `track`, replacing whatever is playing once the new source opens.
    ///
    /// Equivalent to [`begin_play`](Self::begin_play), [`PlayRequest::open`]
    /// and [`finish_play`](Self::finish_play) in sequence.
    #[instrument(skip(self, track), fields(track_id = %track.id, title = %track.title))]
    pub async fn play(&mut self, track: Track) -> Result<()> {
        let request = self.begin_play(track);
        let opened = request.open().await;
        self.finish_play(opened)
    }

    /// Register a play request. Any earlier request still opening is superseded.
    ///
    /// State does not change until the request is finished.
    pub fn begin_play(&mut self, track: Track) -> PlayRequest {
        self.next_generation += 1;
        let generation = SessionGeneration(self.next_generation);

        if let Some(previous) = self.pending.replace(generation) {
            debug!(superseded = %previous, %generation, "Superseding pending play");
        }
        debug!(track_id = %track.id, %generation, "Play requested");

        PlayRequest {
            generation,
            track,
            resolver: Arc::clone(&self.resolver),
            transport: Arc::clone(&self.transport),
        }
    }

    /// Install an opened source as the live session and start playback.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Superseded`] if a later `play` or a `stop` happened
    ///   while the source was opening; the opened transport is closed
    /// - the resolution, open or start failure otherwise, after the engine
    ///   entered `Failed`
    pub fn finish_play(&mut self, opened: OpenedSource) -> Result<()> {
        let OpenedSource {
            generation,
            track,
            result,
        } = opened;

        if self.pending != Some(generation) {
            if let Ok(mut handle) = result {
                handle.close();
            }
            debug!(%generation, track_id = %track.id, "Discarding superseded open");
            return Err(PlaybackError::Superseded);
        }
        self.pending = None;

        self.teardown_session();

        let mut handle = match result {
            Ok(handle) => handle,
            Err(err) => return Err(self.fail(Some(track.id), err)),
        };

        if let Err(e) = handle.set_volume(self.volume) {
            warn!(track_id = %track.id, error = %e, "Failed to apply volume to new session");
        }

        let tx = self.session_tx.clone();
        handle.subscribe(Box::new(move |event| {
            tx.send(SessionEvent {
                generation,
                kind: SessionEventKind::Transport(event),
            })
            .ok();
        }));

        if let Err(e) = handle.play() {
            handle.unsubscribe();
            handle.close();
            return Err(self.fail(Some(track.id), PlaybackError::playback_failure(e)));
        }

        let duration = handle.duration().unwrap_or_default();
        let sampler = self.spawn_sampler(generation);

        info!(
            track_id = %track.id,
            %generation,
            duration_ms = as_millis(duration),
            "Playback started"
        );
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Started {
                track_id: track.id.to_string(),
                title: track.title.clone(),
            }))
            .ok();

        self.session = Some(PlaybackSession {
            generation,
            track,
            handle,
            current_time: Duration::ZERO,
            duration,
            sampler,
        });
        self.state = PlaybackState::Playing;
        self.interrupted = false;
        self.last_error = None;
        self.publish();

        Ok(())
    }

    /// Pause. Ignored unless playing.
    ///
    /// Pausing during an interruption keeps the session paused when the
    /// interruption ends.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            if self.interrupted {
                debug!("Interrupted session paused by user");
                self.interrupted = false;
            }
            trace!(state = ?self.state, "Ignoring pause");
            return;
        }
        self.suspend(false);
    }

    /// Resume. Ignored unless paused with a live session.
    pub fn resume(&mut self) {
        if self.state != PlaybackState::Paused || self.session.is_none() {
            trace!(state = ?self.state, "Ignoring resume");
            return;
        }
        self.continue_playback();
    }

    /// Stop from any state: cancel a pending open, tear the session down,
    /// and return to `Stopped`. Idempotent.
    pub fn stop(&mut self) {
        if let Some(generation) = self.pending.take() {
            debug!(%generation, "Cancelled pending open");
        }
        self.reset_to_stopped();
    }

    /// Move to `position`, clamped to the duration when it is known.
    ///
    /// Ignored without a live session. Play/pause state is unchanged.
    pub fn seek(&mut self, position: Duration) {
        let Some(session) = self.session.as_mut() else {
            trace!("Ignoring seek without session");
            return;
        };

        if let Some(duration) = session.handle.duration() {
            session.duration = duration;
        }
        let target = if session.duration.is_zero() {
            position
        } else {
            position.min(session.duration)
        };

        match session.handle.seek(target) {
            Ok(()) => {
                session.current_time = target;
                debug!(
                    track_id = %session.track.id,
                    position_ms = as_millis(target),
                    "Seeked"
                );
                self.emit_position();
                self.publish();
            }
            Err(e) => {
                let track_id = session.track.id;
                self.fail(Some(track_id), PlaybackError::playback_failure(e));
            }
        }
    }

    /// Set the volume, clamped to `[0, 1]` (NaN counts as 0).
    ///
    /// The value is remembered and applied to every later session. Returns the
    /// applied value.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.volume = volume;

        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.handle.set_volume(volume) {
                warn!(track_id = %session.track.id, error = %e, "Failed to apply volume");
            }
        }

        debug!(volume, "Volume set");
        self.publish();
        volume
    }

    /// Forget the last error. A `Failed` engine becomes `Stopped`.
    pub fn clear_error(&mut self) {
        self.last_error = None;
        if self.state.is_failed() {
            self.state = PlaybackState::Stopped;
        }
        self.publish();
    }

    /// Apply an event produced by a session's listener or sampler.
    ///
    /// Events from any session other than the live one are dropped.
    pub fn handle_event(&mut self, event: SessionEvent) {
        let Some(session) = self.session.as_ref() else {
            trace!(generation = %event.generation, "Dropping event without session");
            return;
        };
        if session.generation != event.generation {
            trace!(
                generation = %event.generation,
                live = %session.generation,
                "Dropping stale session event"
            );
            return;
        }
        let track_id = session.track.id;

        match event.kind {
            SessionEventKind::Sample => self.sample(),
            SessionEventKind::Transport(TransportEvent::EndOfMedia) => {
                info!(%track_id, "Track reached end of media");
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::Completed {
                        track_id: track_id.to_string(),
                    }))
                    .ok();
                self.reset_to_stopped();
            }
            SessionEventKind::Transport(TransportEvent::InterruptionBegan) => {
                info!(%track_id, state = ?self.state, "Output interrupted");
                self.events
                    .emit(CoreEvent::Output(OutputEvent::InterruptionBegan))
                    .ok();
                if self.state == PlaybackState::Playing {
                    self.suspend(true);
                }
            }
            SessionEventKind::Transport(TransportEvent::InterruptionEnded { should_resume }) => {
                info!(%track_id, should_resume, "Output interruption ended");
                self.events
                    .emit(CoreEvent::Output(OutputEvent::InterruptionEnded {
                        should_resume,
                    }))
                    .ok();
                let resume = should_resume
                    && self.interrupted
                    && self.state == PlaybackState::Paused;
                self.interrupted = false;
                if resume {
                    self.continue_playback();
                }
            }
            SessionEventKind::Transport(TransportEvent::Error { message }) => {
                self.fail(Some(track_id), PlaybackError::PlaybackFailure(message));
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Last sampled position, zero without a session.
    pub fn current_time(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |s| s.current_time)
    }

    /// Known duration of the live session, zero until known.
    pub fn duration(&self) -> Duration {
        self.session.as_ref().map_or(Duration::ZERO, |s| s.duration)
    }

    pub fn progress(&self) -> f64 {
        progress(self.current_time(), self.duration())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.as_ref().map(|s| &s.track)
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// Position the transport reports right now, unclamped.
    pub fn live_current_time(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |s| s.handle.current_time())
    }

    /// Whether a play request is waiting for its source to open.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch the published engine state.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot.subscribe()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn suspend(&mut self, by_interruption: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = session.handle.pause() {
            let track_id = session.track.id;
            self.fail(Some(track_id), PlaybackError::playback_failure(e));
            return;
        }

        let track_id = session.track.id;
        let position_ms = as_millis(session.current_time);
        self.interrupted = by_interruption;
        self.state = PlaybackState::Paused;

        debug!(%track_id, position_ms, by_interruption, "Playback paused");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Paused {
                track_id: track_id.to_string(),
                position_ms,
            }))
            .ok();
        self.publish();
    }

    fn continue_playback(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = session.handle.play() {
            let track_id = session.track.id;
            self.fail(Some(track_id), PlaybackError::playback_failure(e));
            return;
        }

        let track_id = session.track.id;
        let position_ms = as_millis(session.current_time);
        self.interrupted = false;
        self.state = PlaybackState::Playing;

        debug!(%track_id, position_ms, "Playback resumed");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Resumed {
                track_id: track_id.to_string(),
                position_ms,
            }))
            .ok();
        self.publish();
    }

    fn sample(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(duration) = session.handle.duration() {
            session.duration = duration;
        }
        let mut time = session.handle.current_time();
        if !session.duration.is_zero() && time > session.duration {
            time = session.duration;
        }
        session.current_time = time;

        self.emit_position();
        self.publish();
    }

    fn emit_position(&self) {
        if let Some(session) = self.session.as_ref() {
            self.events
                .emit(CoreEvent::Playback(PlaybackEvent::PositionChanged {
                    track_id: session.track.id.to_string(),
                    position_ms: as_millis(session.current_time),
                    duration_ms: as_millis(session.duration),
                }))
                .ok();
        }
    }

    fn spawn_sampler(&self, generation: SessionGeneration) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.session_tx.clone();
        let period = self.config.sample_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let event = SessionEvent {
                            generation,
                            kind: SessionEventKind::Sample,
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!(%generation, "Sampler finished");
        });

        token
    }

    /// Tear down the live session, returning its track.
    fn teardown_session(&mut self) -> Option<Track> {
        let mut session = self.session.take()?;

        session.sampler.cancel();
        session.handle.unsubscribe();
        if let Err(e) = session.handle.stop() {
            warn!(track_id = %session.track.id, error = %e, "Transport failed to stop");
        }
        session.handle.close();

        debug!(
            track_id = %session.track.id,
            generation = %session.generation,
            "Session torn down"
        );
        Some(session.track)
    }

    fn reset_to_stopped(&mut self) {
        let track = self.teardown_session();
        self.state = PlaybackState::Stopped;
        self.interrupted = false;

        if let Some(track) = track {
            info!(track_id = %track.id, "Playback stopped");
            self.events
                .emit(CoreEvent::Playback(PlaybackEvent::Stopped {
                    track_id: track.id.to_string(),
                }))
                .ok();
        }
        self.publish();
    }

    /// Enter `Failed`, tearing the session down first. Returns `err`.
    fn fail(&mut self, track_id: Option<TrackId>, err: PlaybackError) -> PlaybackError {
        self.teardown_session();

        let kind = err.failure_kind().unwrap_or(FailureKind::PlaybackFailure);
        self.state = PlaybackState::Failed(kind);
        self.interrupted = false;

        warn!(
            track_id = ?track_id.map(|id| id.to_string()),
            error = %err,
            ?kind,
            "Playback failed"
        );
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                track_id: track_id.map(|id| id.to_string()),
                message: err.to_string(),
                recoverable: err.is_transient(),
            }))
            .ok();

        self.last_error = Some(err.clone());
        self.publish();
        err
    }

    fn publish(&self) {
        let next = EngineSnapshot {
            state: self.state,
            current_time: self.current_time(),
            duration: self.duration(),
            volume: self.volume,
            last_error: self.last_error.clone(),
        };

        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("generation", &self.session.as_ref().map(|s| s.generation))
            .field("pending", &self.pending)
            .field("volume", &self.volume)
            .field("interrupted", &self.interrupted)
            .finish()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.pending = None;
        self.teardown_session();

        match self.output.deactivate() {
            Ok(()) => info!("Output device deactivated"),
            Err(e) => warn!(error = %e, "Failed to deactivate output device"),
        }
        self.events
            .emit(CoreEvent::Output(OutputEvent::Deactivated))
            .ok();
    }
}
