//! Scriptable one-shot client for the quickfile daemon.
//!
//! `quickfile <search|status|refresh> [query]` writes a single request to
//! the daemon's fixed socket and prints the raw response JSON, if one can be
//! captured, to stdout. Missing daemon → JSON error object on stderr and a
//! non-zero exit. No captured response is still a success (fire-and-forget).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use quickfile_launcher::oneshot::OneshotClient;
use quickfile_launcher::protocol::DaemonRequest;

#[derive(Parser)]
#[command(
    name = "quickfile",
    version,
    about = "One-shot client for the quickfile daemon"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the daemon request socket path.
    #[arg(long, value_name = "PATH", global = true)]
    request_socket: Option<PathBuf>,

    /// Override the response socket path.
    #[arg(long, value_name = "PATH", global = true)]
    response_socket: Option<PathBuf>,

    /// Seconds to wait for a pushed response before falling back.
    #[arg(long, value_name = "SECS", default_value_t = 5, global = true)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Fuzzy-search the file index.
    Search {
        /// Query text; empty lists the first files in the index.
        query: Option<String>,
    },
    /// Report daemon status.
    Status,
    /// Trigger an index refresh.
    Refresh,
}

impl Command {
    fn into_request(self) -> DaemonRequest {
        match self {
            Command::Search { query } => DaemonRequest::search(query.unwrap_or_default()),
            Command::Status => DaemonRequest::Status,
            Command::Refresh => DaemonRequest::Refresh,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "quickfile=warn".into()),
        ))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let request_path = cli
        .request_socket
        .unwrap_or_else(|| PathBuf::from(quickfile_launcher::paths::ONESHOT_REQUEST_SOCKET));
    let response_path = cli
        .response_socket
        .unwrap_or_else(|| PathBuf::from(quickfile_launcher::paths::ONESHOT_RESPONSE_SOCKET));
    let mut client = OneshotClient::with_paths(request_path, response_path);
    client.set_response_timeout(Duration::from_secs(cli.timeout));

    match client.dispatch(&cli.command.into_request()).await {
        Ok(Some(frame)) => {
            println!("{frame}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            let report = serde_json::json!({
                "type": "Error",
                "message": err.to_string(),
            });
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}
