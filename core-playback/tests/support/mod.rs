//! Shared fakes for core-playback integration tests.
//!
//! `FakeTransport` keeps every opened handle reachable through a
//! [`HandleControl`] so tests can drive transport callbacks and the playhead.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, Locator, MediaTransport, OutputDeviceSession, ResourceBundle, TransportEvent,
    TransportHandle, TransportListener,
};
use core_playback::{
    BundleSourceResolver, PlaybackConfig, PlaybackEngine, SessionEvents, SourceResolver, Track,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TRACK_A: &str = "https://cdn.example.com/a.mp3";
pub const TRACK_B: &str = "https://cdn.example.com/b.mp3";

pub fn track_a() -> Track {
    Track::remote("Track A", "Artist", TRACK_A)
}

pub fn track_b() -> Track {
    Track::remote("Track B", "Artist", TRACK_B)
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Default)]
struct TransportState {
    default_duration: Option<Duration>,
    durations: HashMap<String, Duration>,
    open_delays: HashMap<String, Duration>,
    failing_opens: HashSet<String>,
    failing_plays: HashSet<String>,
    handles: Vec<HandleControl>,
}

/// In-memory transport. Locators are keyed by their display form.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported by every handle without a per-locator override.
    pub fn with_duration(self, duration: Duration) -> Self {
        self.state.lock().default_duration = Some(duration);
        self
    }

    pub fn set_duration(&self, locator: &str, duration: Duration) {
        self.state
            .lock()
            .durations
            .insert(locator.to_string(), duration);
    }

    pub fn set_open_delay(&self, locator: &str, delay: Duration) {
        self.state
            .lock()
            .open_delays
            .insert(locator.to_string(), delay);
    }

    pub fn fail_open(&self, locator: &str) {
        self.state.lock().failing_opens.insert(locator.to_string());
    }

    pub fn fail_play(&self, locator: &str) {
        self.state.lock().failing_plays.insert(locator.to_string());
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// Control for the most recently opened handle.
    pub fn last_handle(&self) -> HandleControl {
        self.state
            .lock()
            .handles
            .last()
            .cloned()
            .expect("no handle opened")
    }

    /// Control for the most recent handle opened for `locator`.
    pub fn handle_for(&self, locator: &str) -> HandleControl {
        self.state
            .lock()
            .handles
            .iter()
            .rev()
            .find(|handle| handle.locator() == locator)
            .cloned()
            .unwrap_or_else(|| panic!("no handle opened for {}", locator))
    }
}

#[async_trait]
impl MediaTransport for FakeTransport {
    async fn open(&self, locator: &Locator) -> BridgeResult<Box<dyn TransportHandle>> {
        let key = locator.to_string();

        let delay = self.state.lock().open_delays.get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_opens.contains(&key) {
            return Err(BridgeError::Network(format!("cannot reach {}", key)));
        }

        let duration = state
            .durations
            .get(&key)
            .copied()
            .or(state.default_duration);
        let control = HandleControl {
            state: Arc::new(Mutex::new(HandleState {
                locator: key.clone(),
                playing: false,
                position: Duration::ZERO,
                duration,
                volume: 1.0,
                closed: false,
                fail_play: state.failing_plays.contains(&key),
                listener: None,
                play_calls: 0,
            })),
        };
        state.handles.push(control.clone());

        Ok(Box::new(FakeHandle {
            state: Arc::clone(&control.state),
        }))
    }
}

struct HandleState {
    locator: String,
    playing: bool,
    position: Duration,
    duration: Option<Duration>,
    volume: f32,
    closed: bool,
    fail_play: bool,
    listener: Option<TransportListener>,
    play_calls: usize,
}

struct FakeHandle {
    state: Arc<Mutex<HandleState>>,
}

impl TransportHandle for FakeHandle {
    fn play(&mut self) -> BridgeResult<()> {
        let mut state = self.state.lock();
        state.play_calls += 1;
        if state.fail_play {
            return Err(BridgeError::OperationFailed("decoder refused to start".into()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        self.state.lock().playing = false;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> BridgeResult<()> {
        self.state.lock().position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> BridgeResult<()> {
        self.state.lock().volume = volume;
        Ok(())
    }

    fn current_time(&self) -> Duration {
        self.state.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().duration
    }

    fn subscribe(&mut self, listener: TransportListener) {
        self.state.lock().listener = Some(listener);
    }

    fn unsubscribe(&mut self) {
        self.state.lock().listener = None;
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.playing = false;
        state.listener = None;
    }
}

/// Test-side view of one opened handle.
#[derive(Clone)]
pub struct HandleControl {
    state: Arc<Mutex<HandleState>>,
}

impl HandleControl {
    pub fn locator(&self) -> String {
        self.state.lock().locator.clone()
    }

    /// Deliver `event` to the registered listener, if any.
    ///
    /// Returns whether a listener received it.
    pub fn emit(&self, event: TransportEvent) -> bool {
        let state = self.state.lock();
        match state.listener.as_ref() {
            Some(listener) => {
                listener(event);
                true
            }
            None => false,
        }
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.state.lock().duration = duration;
    }

    pub fn position(&self) -> Duration {
        self.state.lock().position
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn has_listener(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn play_calls(&self) -> usize {
        self.state.lock().play_calls
    }
}

// ============================================================================
// Bundle and output
// ============================================================================

/// Bundle backed by a fixed set of `<name>.<extension>` entries.
#[derive(Default)]
pub struct MemoryBundle {
    entries: HashSet<String>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, file_name: &str) -> Self {
        self.entries.insert(file_name.to_string());
        self
    }
}

#[async_trait]
impl ResourceBundle for MemoryBundle {
    async fn locate(&self, name: &str, extension: &str) -> BridgeResult<Option<PathBuf>> {
        let file_name = format!("{}.{}", name, extension);
        Ok(self
            .entries
            .contains(&file_name)
            .then(|| PathBuf::from("/bundle").join(file_name)))
    }
}

/// Output session counting activations and deactivations.
#[derive(Default)]
pub struct RecordingOutput {
    active: AtomicBool,
    refuse: AtomicBool,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        let output = Self::default();
        output.refuse.store(true, Ordering::SeqCst);
        output
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl OutputDeviceSession for RecordingOutput {
    fn activate(&self) -> BridgeResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("output device busy".into()));
        }
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate(&self) -> BridgeResult<()> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Everything needed to build an engine or a service against fakes.
pub struct Fixture {
    pub transport: FakeTransport,
    pub output: Arc<RecordingOutput>,
    pub bundle: Arc<MemoryBundle>,
    pub events: EventBus,
}

impl Fixture {
    pub fn new(transport: FakeTransport) -> Self {
        Self::with_bundle(transport, MemoryBundle::new().with_resource("intro.mp3"))
    }

    pub fn with_bundle(transport: FakeTransport, bundle: MemoryBundle) -> Self {
        Self {
            transport,
            output: Arc::new(RecordingOutput::new()),
            bundle: Arc::new(bundle),
            events: EventBus::new(256),
        }
    }

    pub fn resolver(&self) -> Arc<dyn SourceResolver> {
        Arc::new(BundleSourceResolver::new(self.bundle.clone(), "mp3"))
    }

    pub fn engine(&self) -> (PlaybackEngine, SessionEvents) {
        self.engine_with(PlaybackConfig::default())
    }

    pub fn engine_with(&self, config: PlaybackConfig) -> (PlaybackEngine, SessionEvents) {
        PlaybackEngine::new(
            Arc::new(self.transport.clone()),
            self.resolver(),
            self.output.clone(),
            self.events.clone(),
            config,
        )
        .expect("engine should start")
    }

    pub fn core_config(&self) -> CoreConfig {
        CoreConfig::builder()
            .media_transport(Arc::new(self.transport.clone()))
            .output_session(self.output.clone())
            .resource_bundle(self.bundle.clone())
            .build()
            .expect("core config should build")
    }
}

/// Feed every queued session event back into the engine.
pub fn drain_events(engine: &mut PlaybackEngine, events: &mut SessionEvents) -> usize {
    let mut applied = 0;
    while let Ok(event) = events.try_recv() {
        engine.handle_event(event);
        applied += 1;
    }
    applied
}
