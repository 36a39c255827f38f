//! Peripheral client
//!
//! Owns the byte stream to the alert peripheral. Writes commands as JSON
//! lines and runs a background reader that logs whatever the peripheral
//! sends back.

use crate::error::LinkError;
use crate::protocol::{decode_line, encode, ConnectionState};
use alerting::Command;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, error, info, warn};

/// Default timeout for a single command write
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Any duplex byte stream the client can drive
pub trait LinkStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> LinkStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

type BoxedStream = Box<dyn LinkStream>;

/// Where the client connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Serial device path (e.g. "/dev/ttyUSB0" or "COM3")
    Serial { device: String, baud_rate: u32 },
    /// Pre-opened stream handed over at construction
    Stream,
}

/// Client for the alert peripheral
pub struct PeripheralClient {
    endpoint: Endpoint,
    /// Stream waiting for `connect` when the endpoint is [`Endpoint::Stream`]
    pending: Option<BoxedStream>,
    writer: Option<WriteHalf<BoxedStream>>,
    reader: Option<JoinHandle<()>>,
    state_tx: watch::Sender<ConnectionState>,
    timeout: Duration,
}

impl PeripheralClient {
    /// Create a client for a serial device. Nothing is opened until `connect`.
    pub fn serial(device: &str, baud_rate: u32) -> Self {
        info!("Creating peripheral client for device: {} @ {} baud", device, baud_rate);
        Self::with_endpoint(
            Endpoint::Serial {
                device: device.to_string(),
                baud_rate,
            },
            None,
        )
    }

    /// Create a client over an already open stream
    pub fn from_stream<S: LinkStream>(stream: S) -> Self {
        Self::with_endpoint(Endpoint::Stream, Some(Box::new(stream)))
    }

    /// Create a client backed by an in-memory pipe (no hardware required).
    /// The returned stream is the peripheral's end.
    pub fn mock() -> (Self, tokio::io::DuplexStream) {
        info!("Creating mock peripheral client");
        let (ours, theirs) = tokio::io::duplex(4096);
        let mut client = Self::from_stream(ours);
        client.timeout = Duration::from_millis(100);
        (client, theirs)
    }

    fn with_endpoint(endpoint: Endpoint, pending: Option<BoxedStream>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            endpoint,
            pending,
            writer: None,
            reader: None,
            state_tx,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Open the link and start the receive loop
    pub async fn connect(&mut self) -> Result<(), LinkError> {
        if self.is_connected() {
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);

        let stream = match self.open() {
            Ok(stream) => stream,
            Err(e) => {
                error!("Peripheral connection failed: {}", e);
                self.set_state(e.connection_state());
                return Err(e);
            }
        };

        let (read_half, write_half) = tokio::io::split(stream);
        self.reader = Some(tokio::spawn(receive_loop(read_half, self.state_tx.clone())));
        self.writer = Some(write_half);
        self.set_state(ConnectionState::Connected);

        info!("Peripheral connected ({:?})", self.endpoint);
        Ok(())
    }

    fn open(&mut self) -> Result<BoxedStream, LinkError> {
        match &self.endpoint {
            Endpoint::Serial { device, baud_rate } => {
                let port = tokio_serial::new(device.as_str(), *baud_rate)
                    .timeout(self.timeout)
                    .open_native_async()?;
                Ok(Box::new(port))
            }
            Endpoint::Stream => self.pending.take().ok_or(LinkError::StreamConsumed),
        }
    }

    /// Write one command line
    pub async fn send(&mut self, command: Command) -> Result<(), LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let writer = self.writer.as_mut().ok_or(LinkError::NotConnected)?;
        let bytes = encode(command)?;

        let write = async {
            writer.write_all(&bytes).await?;
            writer.flush().await
        };

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => {
                debug!("Sent {}", command);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Write of {} failed: {}", command, e);
                self.teardown(ConnectionState::ConnectionFailed);
                Err(e.into())
            }
            Err(_) => {
                warn!("Write of {} timed out", command);
                self.teardown(ConnectionState::ConnectionFailed);
                Err(LinkError::Timeout(self.timeout.as_millis() as u64))
            }
        }
    }

    /// Close the link
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Shutdown of peripheral stream failed: {}", e);
            }
            info!("Peripheral disconnected");
        }
        self.teardown(ConnectionState::Disconnected);
    }

    fn teardown(&mut self, state: ConnectionState) {
        self.writer = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.set_state(state);
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Link state {:?} -> {:?}", previous, state);
        }
    }

    /// Set command write timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch link state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Drop for PeripheralClient {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

async fn receive_loop(read_half: ReadHalf<BoxedStream>, state_tx: watch::Sender<ConnectionState>) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match decode_line(&line) {
                    Ok(message) => debug!("Peripheral message: {}", message.kind),
                    Err(e) => warn!("Malformed line from peripheral ({}): {:?}", e, line),
                }
            }
            Ok(None) => {
                info!("Peripheral closed the link");
                state_tx.send_replace(ConnectionState::Disconnected);
                break;
            }
            Err(e) => {
                error!("Peripheral read failed: {}", e);
                state_tx.send_replace(ConnectionState::ConnectionFailed);
                break;
            }
        }
    }
}
