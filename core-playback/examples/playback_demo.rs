//! # Player Service Example
//!
//! Drives the player service against a simulated transport whose playhead
//! follows the wall clock, and prints the published view as it changes.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_desktop::{DesktopOutputSession, DirectoryBundle};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{Locator, MediaTransport, TransportHandle, TransportListener};
use core_playback::{PlaybackConfig, PlayerService, Track};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Simulated transport
// ============================================================================

/// Opens every locator as a silent track of fixed length.
struct SimulatedTransport {
    track_length: Duration,
}

#[async_trait]
impl MediaTransport for SimulatedTransport {
    async fn open(&self, locator: &Locator) -> BridgeResult<Box<dyn TransportHandle>> {
        // Remote sources take a moment to buffer.
        if locator.is_remote() {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        Ok(Box::new(SimulatedHandle {
            length: self.track_length,
            offset: Duration::ZERO,
            started_at: None,
            listener: None,
        }))
    }
}

struct SimulatedHandle {
    length: Duration,
    offset: Duration,
    started_at: Option<Instant>,
    listener: Option<TransportListener>,
}

impl TransportHandle for SimulatedHandle {
    fn play(&mut self) -> BridgeResult<()> {
        self.started_at.get_or_insert_with(Instant::now);
        Ok(())
    }

    fn pause(&mut self) -> BridgeResult<()> {
        self.offset = self.current_time();
        self.started_at = None;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> BridgeResult<()> {
        self.offset = position;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> BridgeResult<()> {
        Ok(())
    }

    fn current_time(&self) -> Duration {
        let running = self.started_at.map_or(Duration::ZERO, |at| at.elapsed());
        self.offset + running
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.length)
    }

    fn subscribe(&mut self, listener: TransportListener) {
        self.listener = Some(listener);
    }

    fn unsubscribe(&mut self) {
        self.listener = None;
    }

    fn close(&mut self) {
        self.listener = None;
        self.started_at = None;
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    // A bundle directory with a single local track.
    let bundle_dir = tempfile::tempdir()?;
    std::fs::write(bundle_dir.path().join("intro.mp3"), b"")?;

    let core = CoreConfig::builder()
        .media_transport(Arc::new(SimulatedTransport {
            track_length: Duration::from_secs(3),
        }))
        .output_session(Arc::new(DesktopOutputSession::new()))
        .resource_bundle(Arc::new(DirectoryBundle::new(bundle_dir.path())))
        .build()?;

    let player = PlayerService::start(core, PlaybackConfig::responsive())?;

    let mut view = player.subscribe();
    let printer = tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let view = view.borrow_and_update().clone();
            let title = view
                .current_track
                .as_ref()
                .map_or("-", |track| track.title.as_str());
            println!(
                "[{:>5}] {:<12} {:>4.1}s / {:>3.1}s ({:>3.0}%)",
                if view.is_playing { "play" } else { "idle" },
                title,
                view.current_time.as_secs_f64(),
                view.duration.as_secs_f64(),
                view.progress * 100.0,
            );
        }
    });

    println!("== Local track");
    player.play(Track::local("Intro", "Demo Band", "intro")).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("== Pause and resume");
    player.pause().await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    player.resume().await?;
    println!("volume set to {}", player.set_volume(1.4).await?);

    println!("== Waiting for the end of the track");
    let mut finished = player.subscribe();
    finished.wait_for(|view| !view.is_playing).await?;

    println!("== Remote track, seek to the middle");
    player
        .play(Track::remote(
            "Stream",
            "Demo Band",
            "https://cdn.example.com/stream.mp3",
        ))
        .await?;
    player.seek(0.5).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    player.stop().await?;

    println!("== Unsupported source");
    if let Err(e) = player
        .play(Track::remote("Legacy", "Demo Band", "ftp://example.com/a.mp3"))
        .await
    {
        println!("play failed: {}", e);
        player.clear_error().await?;
    }

    player.shutdown().await?;
    printer.await?;
    Ok(())
}
