//! Streams an installer artifact to local storage with throttled progress
//! reporting.

use crate::common::fs::ensure_dir;
use crate::common::logging::info;
use crate::config::config_launcher::USER_AGENT;
use crate::launcher::error::LauncherError;
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Size of one streamed chunk.
pub const CHUNK_SIZE: usize = 8192;

/// Minimum wall-clock interval between two progress emissions.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// One download attempt. The destination file is owned exclusively by the
/// Downloader while the transfer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
    /// Fallback total size when the response does not carry a Content-Length.
    pub expected_total_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_transferred: u64,
    /// None means the total is unknown and the progress is indeterminate.
    pub total_bytes: Option<u64>,
}

impl Progress {
    /// Completed percentage, rounded down. None while the total is unknown.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(total) if total > 0 => Some((self.bytes_transferred * 100 / total) as u8),
            _ => None,
        }
    }
}

pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Create a new Downloader instance
    ///
    /// * `timeout` - connect and per-read timeout for the transfer; there is
    ///   no limit on the total transfer duration
    pub fn create(timeout: Duration) -> Result<Self, LauncherError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .timeout(None)
            .build()
            .map_err(LauncherError::transport)?;

        Ok(Downloader { client })
    }

    /// Stream the artifact described by `task` to its destination.
    ///
    /// Any pre-existing file at the destination is deleted before the
    /// transfer starts. Progress is reported through `on_progress` at most
    /// once per [`PROGRESS_INTERVAL`], followed by one final 100% emission
    /// after the file has been flushed. Progress emissions strictly precede
    /// the return of this function. No failure path leaves a partial
    /// artifact behind: the destination is only created after a successful
    /// HTTP status and is deleted again when streaming fails.
    pub fn fetch<F: FnMut(Progress)>(
        &self,
        task: &DownloadTask,
        mut on_progress: F,
    ) -> Result<PathBuf, LauncherError> {
        if let Some(parent) = task.destination.parent() {
            ensure_dir(parent).map_err(LauncherError::Storage)?;
        }

        if task.destination.exists() {
            fs::remove_file(&task.destination).map_err(|e| {
                LauncherError::Storage(format!(
                    "Could not delete stale artifact {:?}: {e}",
                    task.destination
                ))
            })?;
        }

        info(&format!("Downloading {} to {:?}", task.url, task.destination));

        let mut response =
            self.client.get(&task.url).send().map_err(LauncherError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::http_status(status.as_u16()));
        }

        let total_bytes = response.content_length().or(task.expected_total_bytes);

        let bytes_transferred =
            match self.stream_body(&mut response, task, total_bytes, &mut on_progress) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = fs::remove_file(&task.destination);
                    return Err(e);
                }
            };
        on_progress(Progress {
            bytes_transferred,
            total_bytes: Some(total_bytes.unwrap_or(bytes_transferred)),
        });

        info(&format!("Download complete, {bytes_transferred} bytes"));
        Ok(task.destination.clone())
    }

    fn stream_body<F: FnMut(Progress)>(
        &self,
        response: &mut reqwest::blocking::Response,
        task: &DownloadTask,
        total_bytes: Option<u64>,
        on_progress: &mut F,
    ) -> Result<u64, LauncherError> {
        let mut destination = File::create(&task.destination).map_err(|e| {
            LauncherError::Storage(format!("Could not create {:?}: {e}", task.destination))
        })?;

        let mut buffer = [0u8; CHUNK_SIZE];
        let mut bytes_transferred: u64 = 0;
        let mut last_emission = Instant::now();

        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|e| LauncherError::Storage(format!("Could not read response body: {e}")))?;
            if read == 0 {
                break;
            }

            destination.write_all(&buffer[..read]).map_err(|e| {
                LauncherError::Storage(format!("Could not write to {:?}: {e}", task.destination))
            })?;
            bytes_transferred += read as u64;

            if last_emission.elapsed() >= PROGRESS_INTERVAL {
                on_progress(Progress {
                    bytes_transferred,
                    total_bytes,
                });
                last_emission = Instant::now();
            }
        }

        destination.flush().map_err(|e| {
            LauncherError::Storage(format!("Could not flush {:?}: {e}", task.destination))
        })?;

        Ok(bytes_transferred)
    }
}
