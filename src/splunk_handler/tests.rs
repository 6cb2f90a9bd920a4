//! Wire-level tests for the Splunk handler against an in-process collector.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use rstest::{fixture, rstest};

use crate::diagnostics::Diagnostic;
use crate::handler::LogHandler;
use crate::handlers::{HandlerBuilderTrait, SplunkHandlerBuilder};
use crate::level::Level;
use crate::log_record::LogRecord;
use crate::test_utils::CollectingReporter;

use super::SplunkHandler;

#[derive(Debug)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> &str {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn read_headers(reader: &mut BufReader<TcpStream>) -> (Vec<(String, String)>, usize) {
    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim().to_lowercase(), value.trim().to_owned());
        if key == "content-length" {
            content_length = value.parse().unwrap_or(0);
        }
        headers.push((key, value));
    }
    (headers, content_length)
}

fn read_http_request(stream: &mut TcpStream) -> CapturedRequest {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .expect("read request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let (headers, content_length) = read_headers(&mut reader);
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("read body");

    CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// Serve one connection per status in `statuses`, answering in order.
fn spawn_collector(
    listener: TcpListener,
    statuses: Vec<u16>,
) -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for status in statuses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let captured = read_http_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status_text(status)
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(captured);
        }
    });

    (addr, rx)
}

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn builder(addr: SocketAddr) -> SplunkHandlerBuilder {
    SplunkHandlerBuilder::new()
        .with_protocol("http")
        .with_host(addr.ip().to_string())
        .with_port(addr.port())
        .with_token("TOKEN")
        .with_hostname("test_host")
        .with_timeout(Duration::from_secs(5))
        .with_retry_backoff(Duration::from_millis(10))
}

fn record(message: &str) -> LogRecord {
    LogRecord::new("test", Level::Info, message).at(UNIX_EPOCH + Duration::from_secs(10))
}

#[rstest]
fn timer_flush_posts_event_to_collector(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_collector(tcp_listener, vec![200]);
    let handler = builder(addr)
        .with_flush_interval(Duration::from_millis(100))
        .build_inner()
        .expect("build");

    handler.handle(record("hello")).expect("enqueue");

    let captured = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/services/collector");
    assert_eq!(captured.header("authorization"), "Splunk TOKEN");
    assert_eq!(captured.header("content-type"), "application/json");
    assert_eq!(
        captured.body,
        r#"{"event":"hello","host":"test_host","index":"main","source":"test","sourcetype":"text","time":10}"#
    );
    assert_eq!(handler.queued(), 0);
    assert!(
        rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "timer must not resend a delivered batch"
    );
}

#[rstest]
fn drain_sends_batch_without_waiting_for_timer(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_collector(tcp_listener, vec![200]);
    let handler = builder(addr)
        .with_flush_interval(Duration::from_secs(3600))
        .build_inner()
        .expect("build");

    handler.handle(record("one")).expect("enqueue");
    handler.handle(record("two")).expect("enqueue");
    assert!(handler.wait_until_empty(Some(Duration::from_secs(5))));

    let captured = rx.recv_timeout(Duration::from_secs(1)).expect("request");
    let (first, second) = captured
        .body
        .split_once("}{")
        .expect("two concatenated events");
    assert!(first.starts_with(r#"{"event":"one""#));
    assert!(second.starts_with(r#""event":"two""#));
}

#[rstest]
fn retries_on_503_then_succeeds(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_collector(tcp_listener, vec![503, 200]);
    let reporter = Arc::new(CollectingReporter::default());
    let handler = builder(addr)
        .with_flush_interval(Duration::from_secs(3600))
        .with_reporter(reporter.clone())
        .build_inner()
        .expect("build");

    handler.handle(record("retry test")).expect("enqueue");
    assert!(handler.wait_until_empty(Some(Duration::from_secs(5))));

    for _ in 0..2 {
        let request = rx.recv_timeout(Duration::from_secs(1)).expect("request");
        assert!(request.body.contains(r#""event":"retry test""#));
    }
    assert_eq!(
        reporter.count(|d| matches!(d, Diagnostic::DeliveryRetry { attempt: 1, .. })),
        1
    );
    assert_eq!(
        reporter.count(|d| matches!(d, Diagnostic::BatchDelivered { events: 1, .. })),
        1
    );
}

#[rstest]
fn client_error_is_not_retried(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_collector(tcp_listener, vec![400, 200]);
    let reporter = Arc::new(CollectingReporter::default());
    let handler = builder(addr)
        .with_flush_interval(Duration::from_secs(3600))
        .with_reporter(reporter.clone())
        .build_inner()
        .expect("build");

    handler.handle(record("bad request")).expect("enqueue");
    assert!(handler.wait_until_empty(Some(Duration::from_secs(5))));

    rx.recv_timeout(Duration::from_secs(1)).expect("first request");
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(
        reporter.notices(),
        vec![Diagnostic::DeliveryRejected {
            events: 1,
            status: 400
        }]
    );
}

#[rstest]
fn close_drains_pending_events(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_collector(tcp_listener, vec![200]);
    let mut handler: SplunkHandler = builder(addr)
        .with_flush_interval(Duration::from_secs(3600))
        .build_inner()
        .expect("build");

    handler.handle(record("last words")).expect("enqueue");
    handler.close();

    let captured = rx.recv_timeout(Duration::from_secs(1)).expect("request");
    assert!(captured.body.contains(r#""event":"last words""#));
    assert_eq!(handler.handle(record("late")), Err(crate::handler::HandlerError::Closed));
    assert!(!handler.wait_until_empty(Some(Duration::from_millis(10))));
}
