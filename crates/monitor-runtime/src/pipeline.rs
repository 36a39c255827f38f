//! Frame pipeline task
//!
//! Owns the engine. Evaluates frames one at a time, runs the away timer,
//! feeds an empty frame when the detector goes quiet, and forwards every
//! decided command to the dispatcher.

use crate::clock::Clock;
use crate::config::RuntimeConfig;
use crate::dispatcher::Outbound;
use monitor::{
    ControlOutcome, LandmarkFrame, MonitorEngine, MonitorError, MonitorEvent, MonitorState,
    SessionStats,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Requests from the handle, each acknowledged once handled
#[derive(Debug)]
pub(crate) enum Control {
    Start(oneshot::Sender<Result<(), MonitorError>>),
    Stop(oneshot::Sender<Result<(), MonitorError>>),
    Recalibrate(oneshot::Sender<()>),
    Stats(oneshot::Sender<SessionStats>),
    Release(oneshot::Sender<()>),
}

pub(crate) struct Pipeline {
    pub(crate) engine: MonitorEngine,
    pub(crate) frames: mpsc::Receiver<LandmarkFrame>,
    pub(crate) control: mpsc::Receiver<Control>,
    pub(crate) outbound: mpsc::Sender<Outbound>,
    pub(crate) events: broadcast::Sender<MonitorEvent>,
    pub(crate) clock: Clock,
    pub(crate) config: RuntimeConfig,
}

impl Pipeline {
    pub(crate) async fn run(mut self) {
        info!("Starting frame pipeline");

        let idle_after = self.config.idle_frame_after();
        let mut away = time::interval(self.config.away_check());
        away.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut idle = time::interval(idle_after);
        idle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_frame = Instant::now();

        loop {
            tokio::select! {
                biased;

                Some(frame) = self.frames.recv() => {
                    last_frame = Instant::now();
                    self.evaluate(&frame).await;
                }

                control = self.control.recv() => match control {
                    Some(Control::Start(reply)) => {
                        let result = self.engine.start(self.clock.now_ms());
                        last_frame = Instant::now();
                        let result = match result {
                            Ok(outcome) => {
                                self.apply(outcome).await;
                                Ok(())
                            }
                            Err(e) => Err(e),
                        };
                        let _ = reply.send(result);
                    }
                    Some(Control::Stop(reply)) => {
                        let result = match self.engine.stop(self.clock.now_ms()) {
                            Ok(outcome) => {
                                self.apply(outcome).await;
                                Ok(())
                            }
                            Err(e) => Err(e),
                        };
                        let _ = reply.send(result);
                    }
                    Some(Control::Recalibrate(reply)) => {
                        self.engine.recalibrate();
                        let _ = reply.send(());
                    }
                    Some(Control::Stats(reply)) => {
                        let _ = reply.send(self.engine.stats());
                    }
                    Some(Control::Release(reply)) => {
                        self.release().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        debug!("All handles dropped");
                        self.release().await;
                        break;
                    }
                },

                _ = away.tick() => {
                    if let Some(command) = self.engine.check_away(self.clock.now_ms()) {
                        self.publish(MonitorEvent::Command { command });
                        self.transmit(Outbound::Command(command)).await;
                    }
                }

                _ = idle.tick() => {
                    if self.engine.state() != MonitorState::Idle && last_frame.elapsed() >= idle_after {
                        debug!("No frame for {:?}, feeding absence", last_frame.elapsed());
                        last_frame = Instant::now();
                        self.evaluate(&LandmarkFrame::empty(self.clock.now_ms())).await;
                    }
                }
            }
        }

        info!("Frame pipeline stopped");
    }

    async fn evaluate(&mut self, frame: &LandmarkFrame) {
        let outcome = match self.engine.evaluate(frame) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("Frame at {}ms ignored: {}", frame.timestamp_ms, e);
                return;
            }
        };

        for event in outcome.events() {
            self.publish(event);
        }
        for command in outcome.commands {
            self.transmit(Outbound::Command(command)).await;
        }
    }

    async fn apply(&mut self, outcome: ControlOutcome) {
        for event in outcome.events() {
            self.publish(event);
        }
        if let Some(command) = outcome.command {
            self.transmit(Outbound::Command(command)).await;
        }
    }

    async fn release(&mut self) {
        let outcome = self.engine.release(self.clock.now_ms());
        self.apply(outcome).await;
        self.transmit(Outbound::Close).await;
    }

    async fn transmit(&self, msg: Outbound) {
        if self.outbound.send(msg).await.is_err() {
            warn!("Dispatcher gone, dropping {:?}", msg);
        }
    }

    fn publish(&self, event: MonitorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
