//! Download contract against a throwaway local HTTP server.
//!
//! The server answers exactly one request per spawn with a canned status and
//! body, which is enough for `reqwest`'s blocking client.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use foundation::CancellationToken;
use foundation::io::{DownloadProgress, Downloader};
use foundation::logging::{Level, Logger};
use foundation::test_support::MemoryBackend;
use reqwest::blocking::Client;
use url::Url;

fn serve_once(status: &'static str, body: Vec<u8>) -> (Url, JoinHandle<()>) {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let mut response = head.into_bytes();
    response.extend_from_slice(&body);
    serve_raw(response)
}

/// Answer one request with `response` verbatim, then hang up.
fn serve_raw(response: Vec<u8>) -> (Url, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line).expect("read request");
            if n == 0 || line == "\r\n" {
                break;
            }
        }
        // The client may hang up early on error statuses.
        let _ = stream.write_all(&response);
        let _ = stream.flush();
    });
    let url = Url::parse(&format!("http://{addr}/artifacts/solc.bin")).expect("url");
    (url, handle)
}

/// Loopback requests must not be routed through an environment proxy.
fn local_downloader(log: Logger) -> Downloader {
    let client = Client::builder().no_proxy().build().expect("client");
    Downloader::with_client(client, log, CancellationToken::never())
}

#[test]
fn successful_transfer_returns_true_with_expected_length() {
    let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let (url, server) = serve_once("200 OK", body.clone());
    let temp = tempfile::tempdir().expect("tempdir");
    let dest = temp.path().join("solc.bin");
    let backend = MemoryBackend::new();

    let downloader = local_downloader(Logger::new(backend.clone()));
    let mut last = None;
    let ok = downloader
        .download_file_with_progress("solc", &url, &dest, |p: DownloadProgress| last = Some(p))
        .expect("download");
    server.join().expect("server");

    assert!(ok);
    assert_eq!(fs::read(&dest).expect("read dest"), body);
    let last = last.expect("progress reported");
    assert_eq!(last.bytes_received, body.len() as u64);
    assert_eq!(last.total_bytes, Some(body.len() as u64));
    assert!(
        backend
            .messages_at(Level::Info)
            .iter()
            .any(|m| m.starts_with("Downloading solc from") && m.contains("completed in"))
    );
}

#[test]
fn error_status_returns_false_and_logs() {
    let (url, server) = serve_once("404 Not Found", b"missing".to_vec());
    let temp = tempfile::tempdir().expect("tempdir");
    let dest = temp.path().join("solc.bin");
    let backend = MemoryBackend::new();

    let downloader = local_downloader(Logger::new(backend.clone()));
    let ok = downloader
        .download_file("solc", &url, &dest)
        .expect("download");
    server.join().expect("server");

    assert!(!ok);
    assert!(!dest.exists());
    let errors = backend.messages_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("404"));
}

#[test]
fn unreachable_host_returns_false_and_logs() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/x.bin")).expect("url");
    let temp = tempfile::tempdir().expect("tempdir");
    let dest = temp.path().join("x.bin");
    let backend = MemoryBackend::new();

    let downloader = local_downloader(Logger::new(backend.clone()));
    let ok = downloader
        .download_file("x", &url, &dest)
        .expect("connection failure is not an error");

    assert!(!ok);
    assert!(!dest.exists());
    let records = backend.records();
    let errors: Vec<_> = records.iter().filter(|r| r.level == Level::Error).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].rendered().starts_with("Request to http://127.0.0.1"));
    assert!(errors[0].error.is_some());
}

#[test]
fn truncated_body_returns_false_and_removes_partial_file() {
    let mut response = b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n".to_vec();
    response.extend_from_slice(&[7u8; 1000]);
    let (url, server) = serve_raw(response);
    let temp = tempfile::tempdir().expect("tempdir");
    let dest = temp.path().join("solc.bin");
    let backend = MemoryBackend::new();

    let downloader = local_downloader(Logger::new(backend.clone()));
    let ok = downloader
        .download_file("solc", &url, &dest)
        .expect("read failure is not an error");
    server.join().expect("server");

    assert!(!ok);
    assert!(!dest.exists());
    assert!(!temp.path().join("solc.bin.part").exists());
    let errors = backend.messages_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Download of solc from"));
}
