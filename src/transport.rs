//! Transport duplex for the two session sockets.
//!
//! The wire is asymmetric: requests are written on one Unix socket, responses
//! arrive pushed on a second one, and nothing correlates a reply to its
//! request. This module owns both roles on a dedicated worker thread running
//! a current-thread tokio runtime; the UI thread talks to it through
//! channels, polling events non-blockingly once per frame. No two handlers
//! ever run against session state concurrently.
//!
//! Arming order matters: the inbound listener is bound before the outbound
//! connect, so the response to the first request cannot be lost.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

use crate::protocol::{DaemonRequest, DaemonResponse};

/// Transport-level errors surfaced to callers.
///
/// Most transport failures are not errors at all from the session's point of
/// view: a failed outbound connect or a mid-stream write error degrade to the
/// disconnected state and show up as a `Connectivity(false)` event.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The worker thread could not be started.
    #[error("failed to start transport worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Events delivered from the transport to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Outbound connectivity changed.
    Connectivity(bool),
    /// One parsed frame from the inbound channel.
    Frame(DaemonResponse),
}

/// Seam between the session state and the transport.
///
/// The interactive session holds a `Box<dyn TransportService>` so tests can
/// inject a mock that records sends and scripts events.
pub trait TransportService {
    /// Queue a request for the outbound socket. No-op while disconnected.
    fn send(&self, request: DaemonRequest);

    /// Poll for the next pending event (non-blocking).
    fn poll_event(&self) -> Option<TransportEvent>;
}

enum Command {
    Send(DaemonRequest),
    Shutdown,
}

/// Handle to the transport worker thread.
///
/// Dropping the handle shuts the worker down, which closes both sockets;
/// session teardown on Confirm/Cancel is just dropping this.
pub struct TransportHandle {
    command_tx: UnboundedSender<Command>,
    event_rx: Receiver<TransportEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TransportHandle {
    /// Spawn the worker: arm the inbound listener at `response_path`, then
    /// connect outbound to `request_path`.
    pub fn spawn(request_path: PathBuf, response_path: PathBuf) -> Result<Self, TransportError> {
        let (command_tx, command_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("quickfile-transport".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("transport runtime failed to start: {e}");
                        let _ = event_tx.send(TransportEvent::Connectivity(false));
                        return;
                    }
                };
                runtime.block_on(worker_main(
                    request_path,
                    response_path.clone(),
                    command_rx,
                    event_tx,
                ));
                // Runtime drop closes the listener; remove its socket file.
                let _ = std::fs::remove_file(&response_path);
            })
            .map_err(TransportError::WorkerSpawn)?;

        Ok(Self {
            command_tx,
            event_rx,
            worker: Some(worker),
        })
    }
}

impl TransportService for TransportHandle {
    fn send(&self, request: DaemonRequest) {
        // Ignore errors: the worker exiting means the session is tearing down.
        let _ = self.command_tx.send(Command::Send(request));
    }

    fn poll_event(&self) -> Option<TransportEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);

        // Quick check for graceful exit, then detach rather than block the
        // UI thread; the worker ends as soon as its runtime unwinds.
        if let Some(handle) = self.worker.take() {
            const QUICK_CHECK_INTERVAL: std::time::Duration =
                std::time::Duration::from_millis(10);
            const MAX_QUICK_CHECKS: u32 = 10;

            for _ in 0..MAX_QUICK_CHECKS {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        warn!("transport worker panicked during shutdown: {e:?}");
                    }
                    return;
                }
                thread::sleep(QUICK_CHECK_INTERVAL);
            }
            debug!("transport worker still running at drop; detaching");
        }
    }
}

/// Stand-in transport for when the runtime directory cannot be resolved.
///
/// Sends are swallowed and no events ever arrive, leaving the session in the
/// "connecting" state without special-casing callers.
pub struct NullTransport;

impl TransportService for NullTransport {
    fn send(&self, _request: DaemonRequest) {}

    fn poll_event(&self) -> Option<TransportEvent> {
        None
    }
}

async fn worker_main(
    request_path: PathBuf,
    response_path: PathBuf,
    mut command_rx: UnboundedReceiver<Command>,
    event_tx: Sender<TransportEvent>,
) {
    // Inbound first. A stale socket file from a dead session would make the
    // bind fail, so clear it; a *live* second session on the same path is a
    // deployment conflict this client does not arbitrate.
    let _ = std::fs::remove_file(&response_path);
    match UnixListener::bind(&response_path) {
        Ok(listener) => {
            let event_tx = event_tx.clone();
            tokio::spawn(listen_inbound(listener, event_tx));
        }
        Err(e) => {
            warn!(
                "could not bind response socket {}: {e}",
                response_path.display()
            );
        }
    }

    let mut writer = match UnixStream::connect(&request_path).await {
        Ok(stream) => {
            debug!("connected to daemon at {}", request_path.display());
            let _ = event_tx.send(TransportEvent::Connectivity(true));
            Some(stream)
        }
        Err(e) => {
            debug!("daemon not reachable at {}: {e}", request_path.display());
            let _ = event_tx.send(TransportEvent::Connectivity(false));
            None
        }
    };

    while let Some(command) = command_rx.recv().await {
        match command {
            Command::Send(request) => {
                // Callers check connectivity; a send while disconnected is a no-op.
                let Some(stream) = writer.as_mut() else {
                    continue;
                };
                if let Err(e) = write_frame(stream, &request).await {
                    warn!("outbound write failed: {e}");
                    writer = None;
                    let _ = event_tx.send(TransportEvent::Connectivity(false));
                }
            }
            Command::Shutdown => break,
        }
    }
}

/// Accept inbound connections one at a time and stream their frames.
///
/// Connections are independent: when one closes, the next is accepted.
/// Lines that do not parse are dropped without surfacing anything.
async fn listen_inbound(listener: UnixListener, event_tx: Sender<TransportEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let mut lines = BufReader::new(stream).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => match serde_json::from_str::<DaemonResponse>(&line) {
                            Ok(frame) => {
                                if event_tx.send(TransportEvent::Frame(frame)).is_err() {
                                    return;
                                }
                            }
                            Err(e) => debug!("discarding malformed frame: {e}"),
                        },
                        Ok(None) => break,
                        Err(e) => {
                            debug!("inbound read error: {e}");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                error!("inbound accept failed: {e}");
                return;
            }
        }
    }
}

/// Serialize one request as a single newline-terminated JSON document.
async fn write_frame(stream: &mut UnixStream, request: &DaemonRequest) -> std::io::Result<()> {
    let mut payload = serde_json::to_string(request).map_err(std::io::Error::other)?;
    payload.push('\n');
    stream.write_all(payload.as_bytes()).await?;
    stream.flush().await
}
