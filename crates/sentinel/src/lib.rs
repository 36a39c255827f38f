//! Posture Sentinel
//!
//! Wires the monitor runtime to a serial peripheral and a JSON-lines
//! landmark feed on stdin.

pub mod feed;
pub mod settings;

pub use feed::{pump, FeedStats};
pub use settings::{LinkSettings, LogSettings, PosturePreset, Settings};

use anyhow::Context;
use monitor::{MonitorEngine, MonitorEvent};
use monitor_runtime::{MonitorHandle, MonitorRuntime};
use peripheral_link::PeripheralClient;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(log: &LogSettings) -> anyhow::Result<()> {
    let level: Level = log
        .level
        .parse()
        .with_context(|| format!("invalid log level {:?}", log.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("failed to set tracing subscriber")
}

/// Run until the feed ends or ctrl-c, then release everything
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut client = PeripheralClient::serial(&settings.link.device, settings.link.baud_rate);
    client.set_timeout(Duration::from_millis(settings.link.write_timeout_ms));

    let engine = MonitorEngine::new(settings.monitor_config());
    let handle = MonitorRuntime::spawn(engine, client, settings.runtime.clone());

    let events = log_events(&handle);
    let link = watch_link(&handle);

    handle.start().await.context("failed to start monitoring")?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = pump(stdin, &handle) => {
            result.context("frame feed failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    let stats = handle.stats().await?;
    info!(
        "Session: {} frames ({} absent, {} repaired), {} commands, {} transitions, {} frames dropped",
        stats.frames_evaluated,
        stats.frames_absent,
        stats.frames_sanitized,
        stats.commands_issued,
        stats.transitions,
        handle.dropped_frames()
    );

    handle.release().await?;
    events.abort();
    link.abort();
    Ok(())
}

fn log_events(handle: &MonitorHandle) -> JoinHandle<()> {
    let mut rx = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(MonitorEvent::StateChanged(t)) => {
                    info!("State: {:?} -> {:?}", t.from, t.to)
                }
                Ok(MonitorEvent::IssueRaised { issue }) => info!("Issue: {}", issue),
                Ok(MonitorEvent::IssueCleared { issue }) => info!("Resolved: {}", issue),
                Ok(MonitorEvent::Command { command }) => info!("Command: {}", command),
                Ok(MonitorEvent::Diagnostics(d)) => {
                    debug!(
                        present = d.present,
                        confidence = d.confidence,
                        score = d.score,
                        pose_landmarks = d.pose_landmarks,
                        "frame {}ms",
                        d.timestamp_ms
                    )
                }
                Err(RecvError::Lagged(missed)) => warn!("Event log lagged, {} events missed", missed),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn watch_link(handle: &MonitorHandle) -> JoinHandle<()> {
    let mut rx = handle.link_state();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            if state.is_failed() {
                warn!("Peripheral link {:?}; send a reconnect to retry", state);
            } else {
                info!("Peripheral link {:?}", state);
            }
        }
    })
}
