//! Runtime spawn and handle

use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::dispatcher::{Dispatcher, Outbound};
use crate::pipeline::{Control, Pipeline};
use crate::RuntimeError;
use monitor::{LandmarkFrame, MonitorEngine, MonitorEvent, SessionStats};
use peripheral_link::{ConnectionState, PeripheralClient};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawns the task set
pub struct MonitorRuntime;

impl MonitorRuntime {
    /// Spawn the pipeline and dispatcher tasks. Must be called inside a tokio runtime.
    pub fn spawn(engine: MonitorEngine, client: PeripheralClient, config: RuntimeConfig) -> MonitorHandle {
        let clock = Clock::new();
        let link_state = client.subscribe();

        let (frame_tx, frame_rx) = mpsc::channel(config.frame_queue.max(1));
        let (control_tx, control_rx) = mpsc::channel(8);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.command_queue.max(1));
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let dispatcher = tokio::spawn(Dispatcher::new(client, outbound_rx, config.keepalive()).run());
        let pipeline = tokio::spawn(
            Pipeline {
                engine,
                frames: frame_rx,
                control: control_rx,
                outbound: outbound_tx.clone(),
                events: events_tx.clone(),
                clock,
                config,
            }
            .run(),
        );

        info!("Monitor runtime spawned");

        MonitorHandle {
            frames: frame_tx,
            control: control_tx,
            outbound: outbound_tx,
            events: events_tx,
            link_state,
            clock,
            released: Arc::new(AtomicBool::new(false)),
            dropped_frames: Arc::new(AtomicU64::new(0)),
            tasks: Arc::new(Mutex::new(vec![pipeline, dispatcher])),
        }
    }
}

/// Cloneable handle to a running monitor
#[derive(Clone)]
pub struct MonitorHandle {
    frames: mpsc::Sender<LandmarkFrame>,
    control: mpsc::Sender<Control>,
    outbound: mpsc::Sender<Outbound>,
    events: broadcast::Sender<MonitorEvent>,
    link_state: watch::Receiver<ConnectionState>,
    clock: Clock,
    released: Arc<AtomicBool>,
    dropped_frames: Arc<AtomicU64>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl MonitorHandle {
    /// Hand a frame to the pipeline, stamped with the runtime clock.
    /// Rejected with [`RuntimeError::Busy`] while a frame is in flight.
    pub fn submit_frame(&self, mut frame: LandmarkFrame) -> Result<(), RuntimeError> {
        self.ensure_live()?;
        frame.timestamp_ms = self.clock.now_ms();

        match self.frames.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Pipeline busy, frame dropped ({} total)", dropped);
                Err(RuntimeError::Busy)
            }
            Err(TrySendError::Closed(_)) => Err(RuntimeError::Released),
        }
    }

    pub async fn start(&self) -> Result<(), RuntimeError> {
        self.request(Control::Start).await??;
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.request(Control::Stop).await??;
        Ok(())
    }

    pub async fn recalibrate(&self) -> Result<(), RuntimeError> {
        self.request(Control::Recalibrate).await
    }

    pub async fn stats(&self) -> Result<SessionStats, RuntimeError> {
        self.request(Control::Stats).await
    }

    /// Re-open the peripheral link after a failure
    pub async fn reconnect(&self) -> Result<(), RuntimeError> {
        self.ensure_live()?;
        self.outbound
            .send(Outbound::Reconnect)
            .await
            .map_err(|_| RuntimeError::Released)
    }

    /// Stop monitoring, close the link, and wait for the tasks to finish.
    /// Only the first call does anything.
    pub async fn release(&self) -> Result<(), RuntimeError> {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!("Runtime already released");
            return Ok(());
        }

        info!("Releasing monitor runtime");
        let (tx, rx) = oneshot::channel();
        if self.control.send(Control::Release(tx)).await.is_ok() {
            let _ = rx.await;
        }

        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Runtime task ended abnormally: {}", e);
            }
        }
        info!("Monitor runtime released");
        Ok(())
    }

    /// Structured events from the pipeline
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Peripheral link state
    pub fn link_state(&self) -> watch::Receiver<ConnectionState> {
        self.link_state.clone()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Milliseconds on the runtime clock
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Control) -> Result<T, RuntimeError> {
        self.ensure_live()?;
        let (tx, rx) = oneshot::channel();
        self.control
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::Released)?;
        rx.await.map_err(|_| RuntimeError::Released)
    }

    fn ensure_live(&self) -> Result<(), RuntimeError> {
        if self.is_released() {
            Err(RuntimeError::Released)
        } else {
            Ok(())
        }
    }
}
