//! Resumable file downloads.
//!
//! Each attempt resumes from whatever is already on disk using an HTTP
//! `Range` request. Transport failures and unexpected statuses are retried
//! with a fixed backoff; bytes written by a failed attempt are kept and
//! resumed by the next one.

use crate::error::{Error, Result};
use futures::StreamExt;
use log::{debug, warn};
use reqwest::header::RANGE;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Retry behaviour for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(crate::constants::DEFAULT_BACKOFF_MS),
        }
    }
}

/// Progress snapshot reported after every written chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    /// Bytes on disk, including what was there before this attempt
    pub downloaded: u64,
    /// Expected final size, when the server or manifest reports one
    pub total: Option<u64>,
}

impl FetchProgress {
    pub fn percent(&self) -> Option<f64> {
        self.total
            .filter(|&t| t > 0)
            .map(|t| self.downloaded as f64 * 100.0 / t as f64)
    }
}

pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &FetchProgress);

    /// Called before waiting to retry
    fn on_retry(&self, _attempt: u32, _max_attempts: u32, _reason: &str) {}
}

/// Sink that discards all progress
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: &FetchProgress) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Bytes were transferred; `resumed_from` is the size found on disk before the final attempt
    Downloaded {
        resumed_from: u64,
        bytes_written: u64,
        size: u64,
    },
    /// The server answered 416: the file on disk is already complete
    AlreadyComplete { size: u64 },
}

impl FetchOutcome {
    pub fn size(&self) -> u64 {
        match self {
            FetchOutcome::Downloaded { size, .. } | FetchOutcome::AlreadyComplete { size } => *size,
        }
    }
}

/// Failure of one attempt
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub struct ResumableFetcher {
    client: Client,
    policy: RetryPolicy,
    chunk_size: usize,
}

impl ResumableFetcher {
    pub fn new(client: Client, policy: RetryPolicy, chunk_size: usize) -> Self {
        Self {
            client,
            policy: RetryPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Download `url` into `destination`, resuming any partial file already there.
    ///
    /// # Errors
    ///
    /// `Download` once every attempt has failed; the partial file is left on disk.
    /// `Io` immediately when the destination cannot be read or written.
    pub async fn fetch(
        &self,
        destination: &Path,
        url: &str,
        expected_size: Option<u64>,
        progress: &dyn ProgressSink,
    ) -> Result<FetchOutcome> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(destination, url, expected_size, progress).await {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptError::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!(
                            "Download of {} failed ({}), retrying ({}/{})",
                            url, last_error, attempt, max_attempts
                        );
                        progress.on_retry(attempt, max_attempts, &last_error);
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        Err(Error::Download {
            url: url.to_string(),
            attempts: max_attempts,
            message: last_error,
        })
    }

    async fn attempt(
        &self,
        destination: &Path,
        url: &str,
        expected_size: Option<u64>,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<FetchOutcome, AttemptError> {
        let local_size = local_size(destination).await?;

        let mut request = self.client.get(url);
        if local_size > 0 {
            debug!("Resuming {} from byte {}", url, local_size);
            request = request.header(RANGE, format!("bytes={}-", local_size));
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::RANGE_NOT_SATISFIABLE => {
                debug!("{} already complete ({} bytes)", destination.display(), local_size);
                Ok(FetchOutcome::AlreadyComplete { size: local_size })
            }
            status @ (StatusCode::OK | StatusCode::PARTIAL_CONTENT) => {
                // A 200 to a range request carries the whole file; the prefix we already have is skipped
                let ignored_range = status == StatusCode::OK && local_size > 0;
                let (skip, total) = match response.content_length() {
                    Some(len) if ignored_range => (local_size, Some(len)),
                    Some(len) => (0, Some(len + local_size)),
                    None if ignored_range => (local_size, expected_size),
                    None => (0, expected_size),
                };

                let mut file = open_destination(destination, local_size > 0).await?;
                let streamed = self
                    .stream_body(response, &mut file, local_size, skip, total, progress)
                    .await;
                // Keep whatever arrived before a failure so the next attempt can resume
                file.flush().await?;
                let written = streamed?;

                Ok(FetchOutcome::Downloaded {
                    resumed_from: local_size,
                    bytes_written: written,
                    size: local_size + written,
                })
            }
            status => Err(AttemptError::Status(status)),
        }
    }

    async fn stream_body(
        &self,
        response: Response,
        file: &mut File,
        local_size: u64,
        mut skip: u64,
        total: Option<u64>,
        progress: &dyn ProgressSink,
    ) -> std::result::Result<u64, AttemptError> {
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(item) = stream.next().await {
            let bytes = item?;
            let mut data = &bytes[..];

            if skip > 0 {
                let n = usize::try_from(skip).unwrap_or(usize::MAX).min(data.len());
                data = &data[n..];
                skip -= n as u64;
            }

            for chunk in data.chunks(self.chunk_size) {
                file.write_all(chunk).await?;
                written += chunk.len() as u64;
                progress.on_progress(&FetchProgress {
                    downloaded: local_size + written,
                    total,
                });
            }
        }

        Ok(written)
    }
}

async fn local_size(path: &Path) -> std::io::Result<u64> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

async fn open_destination(path: &Path, resume: bool) -> std::io::Result<File> {
    if resume {
        OpenOptions::new().append(true).open(path).await
    } else {
        File::create(path).await
    }
}
