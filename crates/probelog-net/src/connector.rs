//! Client role: connect, send, await acknowledgement, retry.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use probelog_types::SensorPayload;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::frame;
use crate::traits::TelemetrySink;

/// Synthetic sensor id used for client-side telemetry events.
const TELEMETRY_SOURCE: &str = "network";

/// Cap, in seconds, on the linear backoff between send attempts.
const MAX_BACKOFF_SECS: u32 = 5;

/// Outbound connection to a listener.
///
/// Holds at most one live socket. A connector is used from a single caller
/// context; it is not designed for concurrent `send` calls on a shared
/// instance.
pub struct Connector {
    config: NetworkConfig,
    stream: Option<TcpStream>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl Connector {
    /// Create a disconnected connector.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            stream: None,
            telemetry: None,
        }
    }

    /// Attach a telemetry sink for connection/send/ack/error events.
    #[must_use]
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Whether a socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the TCP connection, bounded by the configured timeout.
    ///
    /// A failed connect is not retried here; `send` owns the retry loop.
    pub async fn connect(&mut self) -> Result<()> {
        let addr = self.config.addr();
        match timeout(self.config.timeout(), TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                info!("Connected to {addr}");
                self.stream = Some(stream);
                self.emit(1.0, "connection");
                Ok(())
            }
            Ok(Err(e)) => {
                self.emit(0.0, &format!("connection_error: {e}"));
                Err(Error::Connect { addr, source: e })
            }
            Err(_) => {
                self.emit(0.0, "connection_error: timed out");
                Err(Error::Timeout {
                    operation: "connect",
                    duration: self.config.timeout(),
                })
            }
        }
    }

    /// Send one payload and wait for its acknowledgement.
    ///
    /// Connects implicitly when no socket is open. Runs at most
    /// `max(retries, 1)` attempts; between attempts the caller sleeps
    /// `min(attempt, 5)` seconds, a linearly increasing backoff with a
    /// fixed cap. A transport error (as opposed to a timeout or an
    /// unexpected ACK) tears the connection down and reconnects before
    /// the next attempt. Exhausting the budget returns
    /// [`Error::RetriesExhausted`]; the caller decides whether to keep
    /// trying on later calls.
    pub async fn send(&mut self, payload: &SensorPayload) -> Result<()> {
        if self.stream.is_none() {
            self.connect().await?;
        }

        let frame = frame::encode(payload)?;
        let attempts = self.config.retries.max(1);

        for attempt in 1..=attempts {
            match self.try_send(&frame).await {
                Ok(()) => {
                    self.emit(1.0, "ack_received");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Send attempt {attempt}/{attempts} failed: {e}");
                    match &e {
                        Error::Timeout { .. } => {
                            self.emit(0.0, &format!("timeout (attempt {attempt}/{attempts})"));
                        }
                        Error::BadAck(response) => {
                            self.emit(0.0, &format!("invalid_ack: {response}"));
                        }
                        other => {
                            self.emit(0.0, &format!("error: {other} (attempt {attempt}/{attempts})"));
                        }
                    }
                    if e.is_transport() {
                        self.close().await;
                        if let Err(e) = self.connect().await {
                            debug!("Reconnect before next attempt failed: {e}");
                        }
                    }
                }
            }

            if attempt < attempts {
                sleep(Duration::from_secs(u64::from(attempt.min(MAX_BACKOFF_SECS)))).await;
            }
        }

        Err(Error::RetriesExhausted { attempts })
    }

    /// One write-then-wait-for-ACK exchange on the open socket.
    async fn try_send(&mut self, frame: &[u8]) -> Result<()> {
        let telemetry = self.telemetry.clone();
        let read_timeout = self.config.timeout();
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        stream.write_all(frame).await?;
        if let Some(sink) = &telemetry {
            sink.record_event(TELEMETRY_SOURCE, frame.len() as f64, "bytes_sent");
        }

        let mut buf = [0u8; 256];
        let n = match timeout(read_timeout, stream.read(&mut buf)).await {
            Ok(Ok(0)) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                )));
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(Error::Io(e)),
            Err(_) => {
                return Err(Error::Timeout {
                    operation: "acknowledgement",
                    duration: read_timeout,
                });
            }
        };

        let response = &buf[..n];
        if response.trim_ascii() == frame::ACK {
            Ok(())
        } else {
            Err(Error::BadAck(
                String::from_utf8_lossy(response).into_owned(),
            ))
        }
    }

    /// Best-effort shutdown of the socket; safe to call when already
    /// closed. Clears the connection state either way.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            self.emit(0.0, "connection_closed");
        }
    }

    fn emit(&self, value: f64, detail: &str) {
        if let Some(sink) = &self.telemetry {
            sink.record_event(TELEMETRY_SOURCE, value, detail);
        }
    }
}
