use mememori_launcher::launcher::downloader::{DownloadTask, Downloader, Progress};
use mememori_launcher::launcher::error::LauncherError;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;

const BODY_SIZE: usize = 10_000;

fn downloader() -> Downloader {
    Downloader::create(Duration::from_secs(30)).unwrap()
}

fn body() -> Vec<u8> {
    (0..BODY_SIZE).map(|i| (i % 251) as u8).collect()
}

fn task(destination: &Path) -> DownloadTask {
    DownloadTask {
        url: String::new(),
        destination: destination.to_path_buf(),
        expected_total_bytes: None,
    }
}

fn consume_request(stream: &mut TcpStream) {
    let mut data = Vec::new();
    let mut buffer = [0u8; 1024];
    loop {
        let read = stream.read(&mut buffer).unwrap_or(0);
        if read == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..read]);
        if data.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
}

/// serves one request: the given header block, then the body in slices of
/// `chunk_size` bytes with `delay` sleeps in between
fn serve_once(header: String, body: Vec<u8>, chunk_size: usize, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            consume_request(&mut stream);
            let _ = stream.write_all(header.as_bytes());
            for chunk in body.chunks(chunk_size.max(1)) {
                if stream.write_all(chunk).is_err() {
                    return;
                }
                let _ = stream.flush();
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
    });

    format!("http://{addr}/apps/mementomori_1.0.0.apk")
}

fn serve_ok(body: Vec<u8>, chunk_size: usize, delay: Duration) -> String {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    serve_once(header, body, chunk_size, delay)
}

#[test]
fn test_download_reports_monotonic_progress() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    let mut task = task(&destination);
    task.url = serve_ok(body(), 2_000, Duration::from_millis(120));

    let mut progresses: Vec<Progress> = Vec::new();
    let result = downloader().fetch(&task, |progress| progresses.push(progress));

    assert_eq!(result.unwrap(), destination);
    assert_eq!(fs::read(&destination).unwrap(), body());

    // the slow body forces at least one throttled emission before the
    // final one
    assert!(progresses.len() >= 2, "expected progress emissions, got {progresses:?}");
    for pair in progresses.windows(2) {
        assert!(pair[0].bytes_transferred <= pair[1].bytes_transferred);
    }

    let last = progresses.last().unwrap();
    assert_eq!(last.bytes_transferred, BODY_SIZE as u64);
    assert_eq!(last.total_bytes, Some(BODY_SIZE as u64));
    assert_eq!(last.percent(), Some(100));
}

#[test]
fn test_download_creates_missing_destination_dir() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("downloads/nested/mementomori_1.0.0.apk");
    let mut task = task(&destination);
    task.url = serve_ok(body(), BODY_SIZE, Duration::ZERO);

    downloader().fetch(&task, |_| {}).unwrap();

    assert_eq!(fs::read(&destination).unwrap().len(), BODY_SIZE);
}

#[test]
fn test_download_overwrites_preexisting_destination() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    fs::write(&destination, b"stale artifact").unwrap();

    let mut task = task(&destination);
    task.url = serve_ok(body(), BODY_SIZE, Duration::ZERO);

    downloader().fetch(&task, |_| {}).unwrap();

    assert_eq!(fs::read(&destination).unwrap(), body());
}

#[test]
fn test_download_http_error_fails_without_progress() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    let mut task = task(&destination);
    task.url = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        Vec::new(),
        1,
        Duration::ZERO,
    );

    let mut progresses: Vec<Progress> = Vec::new();
    let result = downloader().fetch(&task, |progress| progresses.push(progress));

    match result.unwrap_err() {
        LauncherError::Network { status, .. } => assert_eq!(status, Some(404)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(progresses.is_empty());
    assert!(!destination.exists());
}

#[test]
fn test_download_deletes_preexisting_destination_on_failed_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    fs::write(&destination, b"stale artifact").unwrap();

    let mut task = task(&destination);
    task.url = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
        Vec::new(),
        1,
        Duration::ZERO,
    );

    let result = downloader().fetch(&task, |_| {});

    assert!(result.is_err());
    // the stale file is removed before the transfer begins, a failed
    // attempt must not leave it behind
    assert!(!destination.exists());
}

#[test]
fn test_download_aborted_stream_removes_partial_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    let mut task = task(&destination);

    // promises 10000 bytes but closes the connection after 4096
    let header = format!("HTTP/1.1 200 OK\r\nContent-Length: {BODY_SIZE}\r\nConnection: close\r\n\r\n");
    task.url = serve_once(header, body()[..4_096].to_vec(), 4_096, Duration::ZERO);

    let result = downloader().fetch(&task, |_| {});

    match result.unwrap_err() {
        LauncherError::Storage(_) => {}
        other => panic!("unexpected error: {other}"),
    }
    assert!(!destination.exists());
}

#[test]
fn test_download_without_content_length_is_indeterminate() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    let mut task = task(&destination);

    let header = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string();
    task.url = serve_once(header, body(), 2_000, Duration::from_millis(120));

    let mut progresses: Vec<Progress> = Vec::new();
    downloader().fetch(&task, |progress| progresses.push(progress)).unwrap();

    assert!(progresses.len() >= 2);
    for progress in &progresses[..progresses.len() - 1] {
        assert_eq!(progress.total_bytes, None);
        assert_eq!(progress.percent(), None);
    }

    // the final emission always reads as complete
    let last = progresses.last().unwrap();
    assert_eq!(last.bytes_transferred, BODY_SIZE as u64);
    assert_eq!(last.percent(), Some(100));
}

#[test]
fn test_download_uses_expected_total_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mementomori_1.0.0.apk");
    let mut task = task(&destination);
    task.expected_total_bytes = Some(BODY_SIZE as u64);

    let header = "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string();
    task.url = serve_once(header, body(), 2_000, Duration::from_millis(120));

    let mut progresses: Vec<Progress> = Vec::new();
    downloader().fetch(&task, |progress| progresses.push(progress)).unwrap();

    assert!(progresses.iter().all(|p| p.total_bytes == Some(BODY_SIZE as u64)));
}
