//! # Player Service
//!
//! Runs a [`PlaybackCoordinator`] on its own task and exposes it through a
//! cloneable [`PlayerHandle`].
//!
//! The service task is the coordination context: every state transition
//! happens there. It multiplexes
//!
//! - commands from handles (each answered through a oneshot reply),
//! - session events from transport listeners and samplers,
//! - sources finishing their open on spawned tasks,
//! - engine snapshot changes (push binding),
//! - the monitor interval (pull binding).
//!
//! ```ignore
//! let core = CoreConfig::builder()
//!     .media_transport(Arc::new(MyTransport::new()))
//!     .build()?;
//! let player = PlayerService::start(core, PlaybackConfig::default())?;
//!
//! player.play(Track::local("Intro", "Band", "intro")).await?;
//! let mut view = player.subscribe();
//! while view.changed().await.is_ok() {
//!     println!("{:.0}%", view.borrow().progress * 100.0);
//! }
//! ```

use crate::config::PlaybackConfig;
use crate::coordinator::{PlaybackCoordinator, PlayerView};
use crate::engine::{OpenedSource, PlaybackEngine, SessionEvents, SessionGeneration};
use crate::error::{PlaybackError, Result};
use crate::resolver::BundleSourceResolver;
use crate::traits::SourceResolver;
use crate::types::{as_millis, Track};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

const COMMAND_BUFFER: usize = 32;

/// Commands sent from handles to the service task.
enum Command {
    Play {
        track: Track,
        reply: oneshot::Sender<Result<()>>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<()>,
    },
    Pause {
        reply: oneshot::Sender<()>,
    },
    Resume {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Seek {
        fraction: f64,
        reply: oneshot::Sender<()>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<f32>,
    },
    ClearError {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the player service for sending commands.
///
/// Every command resolves once the service applied it. After shutdown, or if
/// the service task is gone, commands return [`PlaybackError::ServiceStopped`].
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<PlayerView>,
    events: EventBus,
}

impl PlayerHandle {
    /// Play `track` and wait until its source opened and playback started.
    ///
    /// Resolves to [`PlaybackError::Superseded`] if a later `play` or a `stop`
    /// arrives first.
    pub async fn play(&self, track: Track) -> Result<()> {
        self.request(|reply| Command::Play { track, reply }).await?
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.request(|reply| Command::TogglePlayPause { reply }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| Command::Resume { reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Seek to `fraction` of the current duration.
    pub async fn seek(&self, fraction: f64) -> Result<()> {
        self.request(|reply| Command::Seek { fraction, reply }).await
    }

    /// Returns the applied (clamped) volume.
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        self.request(|reply| Command::SetVolume { volume, reply }).await
    }

    pub async fn clear_error(&self) -> Result<()> {
        self.request(|reply| Command::ClearError { reply }).await
    }

    /// Stop the service task, releasing the transport and the output device.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published view.
    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    /// Watch the published view.
    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    /// Stream of playback and output events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| PlaybackError::ServiceStopped)?;
        response.await.map_err(|_| PlaybackError::ServiceStopped)
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Starts the player service.
pub struct PlayerService;

impl PlayerService {
    /// Start the service with the default bundle-backed resolver.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(core: CoreConfig, config: PlaybackConfig) -> Result<PlayerHandle> {
        let resolver: Arc<dyn SourceResolver> = Arc::new(BundleSourceResolver::new(
            Arc::clone(&core.resource_bundle),
            config.local_extension.clone(),
        ));
        Self::start_with_resolver(core, resolver, config)
    }

    /// Start the service with a custom resolver.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_with_resolver(
        core: CoreConfig,
        resolver: Arc<dyn SourceResolver>,
        config: PlaybackConfig,
    ) -> Result<PlayerHandle> {
        core.validate()?;

        let events = EventBus::new(core.event_buffer_size);
        let monitor_period = config.monitor_interval;
        let (engine, session_events) = PlaybackEngine::new(
            Arc::clone(&core.media_transport),
            resolver,
            Arc::clone(&core.output_session),
            events.clone(),
            config,
        )?;

        let coordinator = PlaybackCoordinator::new(engine);
        let view = coordinator.subscribe();

        let start = Instant::now() + monitor_period;
        let mut monitor = tokio::time::interval_at(start, monitor_period);
        monitor.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (opened_tx, opened_rx) = mpsc::unbounded_channel();

        let runtime = PlayerRuntime {
            coordinator,
            commands: command_rx,
            session_events,
            opened_tx,
            opened_rx,
            pending_reply: None,
            monitor,
        };
        tokio::spawn(runtime.run());

        info!(monitor_ms = as_millis(monitor_period), "Player service started");

        Ok(PlayerHandle {
            commands: command_tx,
            view,
            events,
        })
    }
}

/// State owned by the service task.
struct PlayerRuntime {
    coordinator: PlaybackCoordinator,
    commands: mpsc::Receiver<Command>,
    session_events: SessionEvents,
    opened_tx: mpsc::UnboundedSender<OpenedSource>,
    opened_rx: mpsc::UnboundedReceiver<OpenedSource>,
    /// Reply for the latest `play`, answered when its open completes.
    pending_reply: Option<(SessionGeneration, oneshot::Sender<Result<()>>)>,
    monitor: Interval,
}

impl PlayerRuntime {
    async fn run(mut self) {
        let shutdown_reply = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => break Some(reply),
                    Some(command) => self.handle_command(command),
                    None => break None,
                },
                Some(event) = self.session_events.recv() => {
                    self.coordinator.engine_mut().handle_event(event);
                    self.coordinator.sync_from_engine();
                }
                Some(opened) = self.opened_rx.recv() => self.complete_open(opened),
                _ = self.coordinator.engine_changed() => self.coordinator.sync_from_engine(),
                _ = self.monitor.tick() => self.coordinator.on_monitor_tick(),
            }
        };

        if let Some((_, reply)) = self.pending_reply.take() {
            reply.send(Err(PlaybackError::ServiceStopped)).ok();
        }
        // Dropping the coordinator tears the engine down and releases the output.
        drop(self);
        info!("Player service stopped");

        if let Some(reply) = shutdown_reply {
            reply.send(()).ok();
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play { track, reply } => {
                let request = self.coordinator.begin_play(track);
                let generation = request.generation();

                let previous = self.pending_reply.replace((generation, reply));
                if let Some((previous, superseded)) = previous {
                    debug!(superseded = %previous, %generation, "Play superseded");
                    superseded.send(Err(PlaybackError::Superseded)).ok();
                }

                let opened_tx = self.opened_tx.clone();
                tokio::spawn(async move {
                    let opened = request.open().await;
                    opened_tx.send(opened).ok();
                });
            }
            Command::TogglePlayPause { reply } => {
                self.coordinator.toggle_play_pause();
                reply.send(()).ok();
            }
            Command::Pause { reply } => {
                self.coordinator.pause();
                reply.send(()).ok();
            }
            Command::Resume { reply } => {
                self.coordinator.resume();
                reply.send(()).ok();
            }
            Command::Stop { reply } => {
                self.coordinator.stop();
                if let Some((generation, superseded)) = self.pending_reply.take() {
                    debug!(%generation, "Pending play cancelled by stop");
                    superseded.send(Err(PlaybackError::Superseded)).ok();
                }
                reply.send(()).ok();
            }
            Command::Seek { fraction, reply } => {
                self.coordinator.seek(fraction);
                reply.send(()).ok();
            }
            Command::SetVolume { volume, reply } => {
                let applied = self.coordinator.set_volume(volume);
                reply.send(applied).ok();
            }
            Command::ClearError { reply } => {
                self.coordinator.clear_error();
                reply.send(()).ok();
            }
            Command::Shutdown { reply } => {
                // Handled by the run loop.
                reply.send(()).ok();
            }
        }
    }

    fn complete_open(&mut self, opened: OpenedSource) {
        let generation = opened.generation();
        let result = self.coordinator.finish_play(opened);

        let answers_pending = self
            .pending_reply
            .as_ref()
            .is_some_and(|(pending, _)| *pending == generation);
        if answers_pending {
            if let Some((_, reply)) = self.pending_reply.take() {
                reply.send(result).ok();
            }
        }
    }
}
