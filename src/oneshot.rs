//! One-shot client for scripted calls.
//!
//! Bridges the push-based transport into a blocking call/response for the
//! CLI: arm a capture connection on the response socket, write one request,
//! read one complete frame under a timeout. When the response socket is
//! absent or silent, the request degrades to fire-and-forget: still a
//! success, with no output. Callers cannot tell the two successes apart.
//!
//! Unlike the interactive session, this targets the fixed `/tmp` socket
//! paths and opens/closes everything within a single invocation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::paths::{ONESHOT_REQUEST_SOCKET, ONESHOT_RESPONSE_SOCKET};
use crate::protocol::DaemonRequest;

/// Fixed delay between arming the capture connection and writing the
/// request, so the daemon sees the capture endpoint before it replies.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Default bound on waiting for a pushed response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum OneshotError {
    /// The daemon's request socket path does not exist; nothing was sent.
    #[error("daemon socket not found at {0}")]
    DaemonUnavailable(PathBuf),

    /// The request could not be written.
    #[error("failed to reach daemon: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Single-invocation client against the fixed socket paths.
#[derive(Debug)]
pub struct OneshotClient {
    request_path: PathBuf,
    response_path: PathBuf,
    response_timeout: Duration,
}

impl Default for OneshotClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OneshotClient {
    pub fn new() -> Self {
        Self::with_paths(
            PathBuf::from(ONESHOT_REQUEST_SOCKET),
            PathBuf::from(ONESHOT_RESPONSE_SOCKET),
        )
    }

    pub fn with_paths(request_path: PathBuf, response_path: PathBuf) -> Self {
        Self {
            request_path,
            response_path,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }

    /// Send one request; return the first pushed response frame, verbatim,
    /// or `None` under the fire-and-forget fallback.
    ///
    /// # Errors
    ///
    /// `DaemonUnavailable` when the request socket path is missing (checked
    /// before any connection attempt); I/O errors only on the outbound
    /// write path. A dead or silent response channel is never an error.
    pub async fn dispatch(&self, request: &DaemonRequest) -> Result<Option<String>, OneshotError> {
        if !self.request_path.exists() {
            return Err(OneshotError::DaemonUnavailable(self.request_path.clone()));
        }

        // Capture must be armed before the request goes out, or the pushed
        // response races past us. No response socket → no capture attempt.
        let capture = self.arm_capture().await;
        if capture.is_some() {
            sleep(SETTLE_DELAY).await;
        }

        let mut outbound = UnixStream::connect(&self.request_path).await?;
        let mut payload = serde_json::to_string(request)?;
        payload.push('\n');
        outbound.write_all(payload.as_bytes()).await?;
        outbound.flush().await?;

        let Some(stream) = capture else {
            return Ok(None);
        };

        // One complete newline-delimited frame, bounded in time; anything
        // short of that falls through to the fire-and-forget success.
        let mut lines = BufReader::new(stream).lines();
        match timeout(self.response_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => Ok(Some(line)),
            Ok(Ok(None)) => {
                debug!("response channel closed before a frame arrived");
                Ok(None)
            }
            Ok(Err(e)) => {
                debug!("response read failed: {e}");
                Ok(None)
            }
            Err(_) => {
                debug!(
                    "no response within {:?}; falling back to fire-and-forget",
                    self.response_timeout
                );
                Ok(None)
            }
        }
    }

    async fn arm_capture(&self) -> Option<UnixStream> {
        if !self.response_path.exists() {
            return None;
        }
        match UnixStream::connect(&self.response_path).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                debug!(
                    "response socket {} not accepting: {e}",
                    self.response_path.display()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_daemon_socket_fails_before_connecting() {
        let client = OneshotClient::with_paths(
            PathBuf::from("/tmp/quickfile-test-definitely-missing.sock"),
            PathBuf::from("/tmp/quickfile-test-definitely-missing-resp.sock"),
        );
        let err = client.dispatch(&DaemonRequest::Status).await.unwrap_err();
        assert!(matches!(err, OneshotError::DaemonUnavailable(_)));
    }
}
