//! Integration tests for the session transport over real Unix sockets.
//!
//! The daemon side is scripted with blocking std sockets; the transport
//! worker runs its own runtime, so the tests stay plain `#[test]`s and poll
//! events the way the UI loop does.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::time::{Duration, Instant};

use quickfile_launcher::protocol::{DaemonRequest, DaemonResponse};
use quickfile_launcher::transport::{TransportEvent, TransportHandle, TransportService};

fn socket_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("quickfile-test-")
        .tempdir_in("/tmp")
        .expect("create socket dir")
}

/// Poll the handle until an event arrives or the deadline passes.
fn wait_for_event(transport: &TransportHandle, deadline: Duration) -> Option<TransportEvent> {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Some(event) = transport.poll_event() {
            return Some(event);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    None
}

const EVENT_DEADLINE: Duration = Duration::from_secs(2);

#[test]
fn arms_inbound_before_outbound_and_delivers_frames() {
    let dir = socket_dir();
    let request_path = dir.path().join("quickfile-daemon.sock");
    let response_path = dir.path().join("quickfile-response.sock");

    let daemon_listener = UnixListener::bind(&request_path).expect("bind daemon socket");

    let transport =
        TransportHandle::spawn(request_path.clone(), response_path.clone()).expect("spawn");

    // Outbound connect lands on the daemon listener...
    let (daemon_side, _) = daemon_listener.accept().expect("accept");
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Connectivity(true))
    );

    // ...and by then the response listener is already armed, so the reply
    // to the very first request cannot be lost.
    assert!(response_path.exists(), "inbound must be armed first");

    // A request goes out as exactly one JSON line.
    transport.send(DaemonRequest::search("abc"));
    let mut reader = BufReader::new(daemon_side.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).expect("read request");
    assert_eq!(line, "{\"type\":\"Search\",\"query\":\"abc\",\"limit\":100}\n");

    // The daemon pushes a frame by connecting to the response socket.
    let mut push = UnixStream::connect(&response_path).expect("daemon connects back");
    writeln!(push, "{}", r#"{"type":"Error","message":"nope"}"#).unwrap();
    push.flush().unwrap();

    match wait_for_event(&transport, EVENT_DEADLINE) {
        Some(TransportEvent::Frame(DaemonResponse::Error { message })) => {
            assert_eq!(message, "nope");
        }
        other => panic!("expected error frame, got {other:?}"),
    }

    // Teardown closes both channels and clears the response socket file.
    drop(transport);
    let start = Instant::now();
    while response_path.exists() && start.elapsed() < EVENT_DEADLINE {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!response_path.exists(), "socket file removed at teardown");
}

#[test]
fn malformed_frames_are_discarded_silently() {
    let dir = socket_dir();
    let request_path = dir.path().join("quickfile-daemon.sock");
    let response_path = dir.path().join("quickfile-response.sock");

    let _daemon_listener = UnixListener::bind(&request_path).expect("bind daemon socket");
    let transport =
        TransportHandle::spawn(request_path.clone(), response_path.clone()).expect("spawn");
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Connectivity(true))
    );

    let mut push = UnixStream::connect(&response_path).expect("connect response socket");
    writeln!(push, "this is not a frame").unwrap();
    writeln!(push, "{}", r#"{"bad":"no tag"}"#).unwrap();
    writeln!(push, "{}", r#"{"type":"RefreshComplete","files_count":7}"#).unwrap();
    push.flush().unwrap();

    // Only the well-formed frame surfaces.
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Frame(DaemonResponse::RefreshComplete {
            files_count: 7
        }))
    );
    assert_eq!(wait_for_event(&transport, Duration::from_millis(200)), None);
}

#[test]
fn missing_daemon_reports_disconnected_and_sends_are_noops() {
    let dir = socket_dir();
    let request_path = dir.path().join("quickfile-daemon.sock");
    let response_path = dir.path().join("quickfile-response.sock");

    // No listener at the request path at all.
    let transport = TransportHandle::spawn(request_path, response_path).expect("spawn");
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Connectivity(false))
    );

    // Sending while disconnected does nothing, and produces nothing.
    transport.send(DaemonRequest::search("ignored"));
    assert_eq!(wait_for_event(&transport, Duration::from_millis(200)), None);
}

#[test]
fn sequential_inbound_connections_are_each_drained() {
    let dir = socket_dir();
    let request_path = dir.path().join("quickfile-daemon.sock");
    let response_path = dir.path().join("quickfile-response.sock");

    let _daemon_listener = UnixListener::bind(&request_path).expect("bind daemon socket");
    let transport =
        TransportHandle::spawn(request_path.clone(), response_path.clone()).expect("spawn");
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Connectivity(true))
    );

    {
        let mut first = UnixStream::connect(&response_path).unwrap();
        writeln!(first, "{}", r#"{"type":"RefreshComplete","files_count":1}"#).unwrap();
    }
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Frame(DaemonResponse::RefreshComplete {
            files_count: 1
        }))
    );

    // After the first connection closes, the next one is accepted.
    {
        let mut second = UnixStream::connect(&response_path).unwrap();
        writeln!(
            second,
            "{}",
            r#"{"type":"RefreshComplete","files_count":2}"#
        )
        .unwrap();
    }
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Frame(DaemonResponse::RefreshComplete {
            files_count: 2
        }))
    );
}

#[test]
fn frames_surface_in_arrival_order() {
    // The protocol has no request ids; this pins down that the transport
    // preserves arrival order, which is the only correlation there is.
    let dir = socket_dir();
    let request_path = dir.path().join("quickfile-daemon.sock");
    let response_path = dir.path().join("quickfile-response.sock");

    let _daemon_listener = UnixListener::bind(&request_path).expect("bind daemon socket");
    let transport =
        TransportHandle::spawn(request_path.clone(), response_path.clone()).expect("spawn");
    assert_eq!(
        wait_for_event(&transport, EVENT_DEADLINE),
        Some(TransportEvent::Connectivity(true))
    );

    let mut push = UnixStream::connect(&response_path).unwrap();
    for count in [10, 20, 30] {
        writeln!(push, r#"{{"type":"RefreshComplete","files_count":{count}}}"#).unwrap();
    }
    push.flush().unwrap();

    for count in [10, 20, 30] {
        assert_eq!(
            wait_for_event(&transport, EVENT_DEADLINE),
            Some(TransportEvent::Frame(DaemonResponse::RefreshComplete {
                files_count: count
            }))
        );
    }
}
