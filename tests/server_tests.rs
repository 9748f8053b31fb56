//! End-to-end tests over TCP
//!
//! These tests verify:
//! - Byte-exact replies for every command
//! - One command per connection, then close
//! - Cache file contents after a served request
//! - A silent client cannot stall the loop past the read timeout
//! - Shutdown unblocks an idle accept loop

mod common;

use std::fs;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::StubTransliterator;
use skkbridge::network::{Server, ShutdownHandle};
use skkbridge::protocol::encode_text;
use skkbridge::{Config, LookupService};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    cache_path: PathBuf,
    calls: Arc<AtomicUsize>,
    shutdown: ShutdownHandle,
    handle: Option<thread::JoinHandle<()>>,
    _temp: TempDir,
}

impl TestServer {
    fn start(remote: StubTransliterator) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("cache.tsv");
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .cache_path(&cache_path)
            .read_timeout_ms(300)
            .write_timeout_ms(1000)
            .build();

        let calls = remote.calls();
        let service = LookupService::from_config(&config, remote);
        let mut server = Server::new(config, service);
        let addr = server.bind().unwrap();
        let shutdown = server.shutdown_handle();

        let handle = thread::spawn(move || {
            server.run().unwrap();
        });

        Self {
            addr,
            cache_path,
            calls,
            shutdown,
            handle: Some(handle),
            _temp: temp_dir,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Send one frame and collect everything until the server closes
    fn exchange(&self, frame: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(frame).unwrap();

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).unwrap();
        reply
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn request_frame(reading: &str) -> Vec<u8> {
    let mut frame = vec![0x01];
    frame.extend_from_slice(&encode_text(reading));
    frame.extend_from_slice(b" \n");
    frame
}

fn found_reply(conversion: &str) -> Vec<u8> {
    let mut reply = b"1/".to_vec();
    reply.extend_from_slice(&encode_text(conversion));
    reply.push(b'\n');
    reply
}

// =============================================================================
// Request Tests
// =============================================================================

#[test]
fn test_request_found_and_cached() {
    let server = TestServer::start(StubTransliterator::new().with_answer("ねこ", "猫"));

    let reply = server.exchange(&request_frame("ねこ"));
    assert_eq!(reply, found_reply("猫"));
    assert_eq!(server.calls(), 1);

    let contents = fs::read_to_string(&server.cache_path).unwrap();
    let fields: Vec<&str> = contents.trim_end_matches('\n').split('\t').collect();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.ends_with('\n'));
    assert_eq!(fields.len(), 3);
    assert!(fields[0].parse::<u64>().is_ok());
    assert_eq!(&fields[1..], &["ねこ", "猫"]);

    // Within TTL: same reply, no extra remote call
    let again = server.exchange(&request_frame("ねこ"));
    assert_eq!(again, found_reply("猫"));
    assert_eq!(server.calls(), 1);
}

#[test]
fn test_request_framing_ascii_reading() {
    let server = TestServer::start(StubTransliterator::new().with_answer("neko", "猫"));

    assert_eq!(server.exchange(b"\x01neko \n"), found_reply("猫"));
}

#[test]
fn test_request_not_found_echoes_reading() {
    let server = TestServer::start(StubTransliterator::new());

    assert_eq!(server.exchange(b"\x01mishiranu\n"), b"4mishiranu \n");
    assert_eq!(server.calls(), 1);
    assert!(!server.cache_path.exists());
}

#[test]
fn test_request_not_found_japanese_reading() {
    let server = TestServer::start(StubTransliterator::new());

    let mut expected = b"4".to_vec();
    expected.extend_from_slice(&encode_text("みしらぬ"));
    expected.extend_from_slice(b" \n");

    assert_eq!(server.exchange(&request_frame("みしらぬ")), expected);
}

#[test]
fn test_request_with_ascii_tag() {
    let server = TestServer::start(StubTransliterator::new().with_answer("neko", "猫"));

    assert_eq!(server.exchange(b"1neko \n"), found_reply("猫"));
}

#[test]
fn test_request_invalid_encoding_is_error() {
    let server = TestServer::start(StubTransliterator::new());

    assert_eq!(server.exchange(b"\x01\xa4 \n"), b"0\n");
    assert_eq!(server.calls(), 0);
}

#[test]
fn test_request_empty_reading_not_found() {
    let server = TestServer::start(StubTransliterator::new());

    assert_eq!(server.exchange(b"\x01 \n"), b"4 \n");
    assert_eq!(server.calls(), 0);
}

// =============================================================================
// Other Command Tests
// =============================================================================

#[test]
fn test_version() {
    let server = TestServer::start(StubTransliterator::new());

    let reply = server.exchange(b"\x02");
    let expected = format!("{}/{} ", skkbridge::SERVER_NAME, skkbridge::VERSION);

    assert_eq!(reply, expected.as_bytes());
    assert_eq!(server.calls(), 0);
}

#[test]
fn test_host() {
    let server = TestServer::start(StubTransliterator::new());

    let reply = server.exchange(b"\x03");
    let expected = format!("{}:{}: ", server.addr.ip(), server.addr.port());

    assert_eq!(reply, expected.as_bytes());
}

#[test]
fn test_end_closes_without_reply() {
    let server = TestServer::start(StubTransliterator::new());

    assert!(server.exchange(b"\x00").is_empty());
}

#[test]
fn test_unknown_tag_closes_without_reply() {
    let server = TestServer::start(StubTransliterator::new());

    assert!(server.exchange(b"\x09hello\n").is_empty());
    assert_eq!(server.calls(), 0);
}

// =============================================================================
// Connection Lifecycle Tests
// =============================================================================

#[test]
fn test_single_command_per_connection() {
    let server = TestServer::start(StubTransliterator::new().with_answer("neko", "猫"));

    // A second command in the same frame is never served
    let reply = server.exchange(b"\x01neko \n\x02");
    assert_eq!(reply, found_reply("猫"));
}

#[test]
fn test_second_command_after_reply_is_ignored() {
    let server = TestServer::start(StubTransliterator::new());

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(b"\x02").unwrap();

    let mut first = Vec::new();
    stream.read_to_end(&mut first).unwrap();
    assert!(!first.is_empty());

    // Server already closed; whatever we send now goes nowhere
    let _ = stream.write_all(b"\x02");
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest);
    assert!(rest.is_empty());
}

#[test]
fn test_peer_close_without_data() {
    let server = TestServer::start(StubTransliterator::new());

    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut reply = Vec::new();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.read_to_end(&mut reply).unwrap();
    assert!(reply.is_empty());

    // Server keeps serving
    assert!(!server.exchange(b"\x02").is_empty());
}

#[test]
fn test_silent_client_does_not_stall_server() {
    let server = TestServer::start(StubTransliterator::new());

    // Connects and never sends anything
    let _idle = TcpStream::connect(server.addr).unwrap();
    thread::sleep(Duration::from_millis(50));

    let reply = server.exchange(b"\x02");
    assert!(!reply.is_empty());
}

#[test]
fn test_shutdown_stops_server() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .cache_path(temp_dir.path().join("cache.tsv"))
        .build();

    let service = LookupService::from_config(&config, StubTransliterator::new());
    let mut server = Server::new(config, service);
    let addr = server.bind().unwrap();
    assert_eq!(server.local_addr(), Some(addr));

    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run());

    shutdown.shutdown();
    assert!(handle.join().unwrap().is_ok());
    assert!(shutdown.is_shutdown());
}

#[test]
fn test_shutdown_wakes_idle_server_promptly() {
    let mut server = TestServer::start(StubTransliterator::new());

    // Let the loop settle into a blocking accept
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    server.shutdown.shutdown();
    server.handle.take().unwrap().join().unwrap();

    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_shutdown_wakes_wildcard_bound_server() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .listen_addr("0.0.0.0:0")
        .cache_path(temp_dir.path().join("cache.tsv"))
        .build();

    let service = LookupService::from_config(&config, StubTransliterator::new());
    let mut server = Server::new(config, service);
    let addr = server.bind().unwrap();
    assert!(addr.ip().is_unspecified());

    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run());
    thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    shutdown.shutdown();
    assert!(handle.join().unwrap().is_ok());
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn test_back_to_back_requests_are_served_without_delay() {
    let server = TestServer::start(StubTransliterator::new());

    let expected = format!("{}/{} ", skkbridge::SERVER_NAME, skkbridge::VERSION);

    let started = Instant::now();
    for _ in 0..20 {
        assert_eq!(server.exchange(b"2"), expected.as_bytes());
    }

    assert!(started.elapsed() < Duration::from_secs(2));
}
