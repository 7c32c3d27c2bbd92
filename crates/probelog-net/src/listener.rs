//! Server role: accept connections and hand decoded payloads onward.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::frame;
use crate::traits::{PayloadObserver, TelemetrySink};

/// Synthetic sensor id used for server-side telemetry events.
const TELEMETRY_SOURCE: &str = "server";

/// Connections with no inbound line for this long are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

type Registry = Arc<Mutex<HashSet<SocketAddr>>>;

/// Accepts TCP connections and serves each on its own task.
///
/// `run` drives the accept loop until `stop` is called; `stop` cancels the
/// loop and every handler, then waits for them to finish, so no handler
/// outlives it.
pub struct Listener {
    listener: TcpListener,
    registry: Registry,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    observer: Arc<dyn PayloadObserver>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl Listener {
    /// Bind to `port` on all interfaces with `SO_REUSEADDR` set, so a
    /// restart can rebind while old sockets linger in TIME_WAIT.
    pub async fn bind(port: u16, observer: Arc<dyn PayloadObserver>) -> Result<Self> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        let listener = socket.listen(1024)?;
        Ok(Self {
            listener,
            registry: Arc::new(Mutex::new(HashSet::new())),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            observer,
            telemetry: None,
        })
    }

    /// Attach a telemetry sink for lifecycle and per-connection events.
    #[must_use]
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Accept connections until `stop` is called.
    pub async fn run(&self) {
        if let Ok(addr) = self.local_addr() {
            info!("Listening on {addr}");
            self.emit(1.0, &format!("started_on_port_{}", addr.port()));
        }

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        self.registry
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .insert(peer);
                        info!("Connection from {peer}");
                        self.emit(1.0, &format!("connection_from_{peer}"));
                        self.tracker.spawn(handle_client(
                            stream,
                            peer,
                            Arc::clone(&self.registry),
                            Arc::clone(&self.observer),
                            self.telemetry.clone(),
                            self.shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        if self.shutdown.is_cancelled() {
                            break;
                        }
                        error!("Accept failed: {e}");
                        self.emit(0.0, &format!("accept_error: {e}"));
                    }
                },
            }
        }
    }

    /// Stop accepting, cancel every handler, and wait for them to exit.
    /// Idempotent.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("Server stopped");
        self.emit(0.0, "server_stopped");
    }

    fn emit(&self, value: f64, detail: &str) {
        if let Some(sink) = &self.telemetry {
            sink.record_event(TELEMETRY_SOURCE, value, detail);
        }
    }
}

/// Serve one connection: reframe into lines, decode, observe, ACK.
///
/// Malformed lines are logged and dropped without an ACK; the connection
/// stays open. Exits on peer close, idle timeout, read/write error, or
/// shutdown.
async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Registry,
    observer: Arc<dyn PayloadObserver>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    shutdown: CancellationToken,
) {
    let emit = |value: f64, detail: &str| {
        if let Some(sink) = &telemetry {
            sink.record_event(TELEMETRY_SOURCE, value, detail);
        }
    };

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = timeout(IDLE_TIMEOUT, lines.next_line()) => match read {
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => {
                    debug!("Peer {peer} closed the connection");
                    break;
                }
                Ok(Err(e)) => {
                    warn!("Read from {peer} failed: {e}");
                    break;
                }
                Err(_) => {
                    info!("Closing idle connection from {peer}");
                    break;
                }
            },
        };

        match frame::decode(&line) {
            Ok(payload) => {
                observer.on_payload(peer, &payload);
                emit(line.len() as f64, &format!("data_received_from_{peer}"));
                if let Err(e) = write_half.write_all(frame::ACK_LINE).await {
                    warn!("Failed to acknowledge {peer}: {e}");
                    break;
                }
                emit(1.0, &format!("ack_sent_to_{peer}"));
            }
            Err(e) => {
                warn!("Discarding malformed frame from {peer}: {e}");
                emit(0.0, &format!("json_decode_error: {e}"));
            }
        }
    }

    registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&peer);
    info!("Disconnected {peer}");
    emit(0.0, &format!("disconnected_{peer}"));
}
