//! Socket path resolution.
//!
//! The interactive session uses the per-user runtime directory; the one-shot
//! CLI targets fixed `/tmp` paths shared with the daemon's default
//! deployment.

use std::path::PathBuf;
use std::process::Command;

/// Request socket filename (client writes, daemon listens).
pub const REQUEST_SOCKET_NAME: &str = "quickfile-daemon.sock";

/// Response socket filename (client listens, daemon connects and pushes).
pub const RESPONSE_SOCKET_NAME: &str = "quickfile-response.sock";

/// Fixed request socket path used by the one-shot CLI.
pub const ONESHOT_REQUEST_SOCKET: &str = "/tmp/quickfile-daemon.sock";

/// Fixed response socket path used by the one-shot CLI.
pub const ONESHOT_RESPONSE_SOCKET: &str = "/tmp/quickfile-response.sock";

/// The two socket endpoints of one interactive session.
#[derive(Debug, Clone)]
pub struct SessionSockets {
    pub request: PathBuf,
    pub response: PathBuf,
}

/// Resolve the per-user runtime directory.
///
/// `$XDG_RUNTIME_DIR` wins when set; otherwise the invoking user's numeric
/// id is looked up via `id -u` and mapped to `/run/user/<uid>`. Returns
/// `None` when neither works; all session socket activity is gated on this.
pub fn runtime_dir() -> Option<PathBuf> {
    if let Some(dir) = dirs::runtime_dir() {
        return Some(dir);
    }

    let output = Command::new("id").arg("-u").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let uid = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if uid.is_empty() || !uid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(PathBuf::from(format!("/run/user/{uid}")))
}

/// Socket paths for an interactive session, if the runtime dir resolves.
pub fn session_sockets() -> Option<SessionSockets> {
    let dir = runtime_dir()?;
    Some(SessionSockets {
        request: dir.join(REQUEST_SOCKET_NAME),
        response: dir.join(RESPONSE_SOCKET_NAME),
    })
}
