//! Command dispatcher
//!
//! Sole owner of the peripheral client. Transmits commands in the order
//! they were decided and sends keepalives while connected.

use monitor::Command;
use peripheral_link::PeripheralClient;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Work for the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outbound {
    Command(Command),
    Reconnect,
    Close,
}

pub(crate) struct Dispatcher {
    client: PeripheralClient,
    rx: mpsc::Receiver<Outbound>,
    keepalive: Duration,
}

impl Dispatcher {
    pub(crate) fn new(client: PeripheralClient, rx: mpsc::Receiver<Outbound>, keepalive: Duration) -> Self {
        Self {
            client,
            rx,
            keepalive,
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Starting command dispatcher");
        if let Err(e) = self.client.connect().await {
            warn!("Peripheral unavailable at startup: {}", e);
        }

        let mut keepalive = time::interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(Outbound::Command(command)) => self.transmit(command).await,
                    Some(Outbound::Reconnect) => self.reconnect().await,
                    Some(Outbound::Close) | None => break,
                },

                _ = keepalive.tick() => {
                    if self.client.is_connected() {
                        self.transmit(Command::Keepalive).await;
                    }
                }
            }
        }

        self.client.close().await;
        info!("Command dispatcher stopped");
    }

    async fn transmit(&mut self, command: Command) {
        if !self.client.is_connected() {
            debug!("Link {:?}, dropping {}", self.client.state(), command);
            return;
        }
        if let Err(e) = self.client.send(command).await {
            error!("Failed to send {}: {}", command, e);
        }
    }

    async fn reconnect(&mut self) {
        info!("Reconnecting peripheral");
        self.client.close().await;
        if let Err(e) = self.client.connect().await {
            warn!("Reconnect failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

    #[tokio::test(start_paused = true)]
    async fn test_commands_then_keepalive() {
        let (client, peer) = PeripheralClient::mock();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(Dispatcher::new(client, rx, Duration::from_secs(30)).run());

        tx.send(Outbound::Command(Command::Normal)).await.unwrap();
        tx.send(Outbound::Command(Command::PostureAlert(3))).await.unwrap();

        let started = Instant::now();
        let mut lines = BufReader::new(peer).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "{\"type\":\"NORMAL\"}");
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            "{\"type\":\"POSTURE_ALERT_L3\"}"
        );
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "{\"type\":\"KEEPALIVE\"}");
        assert!(started.elapsed() >= Duration::from_secs(30));

        tx.send(Outbound::Close).await.unwrap();
        task.await.unwrap();
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_keepalive_when_disconnected() {
        let (client, peer) = PeripheralClient::mock();
        let mut state = client.subscribe();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(Dispatcher::new(client, rx, Duration::from_secs(30)).run());

        state
            .wait_for(|s| *s == peripheral_link::ConnectionState::Connected)
            .await
            .unwrap();

        // Peer hangs up its sending side but keeps reading
        let (mut peer_rx, mut peer_tx) = tokio::io::split(peer);
        peer_tx.shutdown().await.unwrap();
        state
            .wait_for(|s| *s == peripheral_link::ConnectionState::Disconnected)
            .await
            .unwrap();

        time::sleep(Duration::from_secs(95)).await;
        tx.send(Outbound::Command(Command::Normal)).await.unwrap();
        tx.send(Outbound::Close).await.unwrap();
        task.await.unwrap();

        let mut received = String::new();
        peer_rx.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "");
    }
}
