//! Archive job orchestration split into focused submodules.
//!
//! A download moves through `Creating → Polling → Downloading` and ends in exactly
//! one of the terminal states of [`DownloadState`]:
//! - [`create`] - Job-creation call
//! - [`poll`] - Status polling until the job is ready, with retry and deadline
//! - [`stream`] - Streaming the archive into the caller's sink

mod create;
mod poll;
mod stream;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpClient, ReqwestClient};
use crate::job::ArchiveJobInfo;
use crate::request::ArchiveRequest;
use crate::types::{ArchiveItem, DownloadOptions, DownloadState, DownloadStatus, Event};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::broadcast;
use tokio::time::sleep_until;
use url::Url;

use poll::PollSession;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives archive jobs from creation to a finished download
///
/// Cloning is cheap; clones share the HTTP client and the event channel, so one
/// instance can serve many concurrent downloads. Each download owns its own job
/// and sink.
#[derive(Clone)]
pub struct ZipDownloader {
    client: Arc<dyn HttpClient>,
    config: Arc<Config>,
    creation_url: Url,
    event_tx: broadcast::Sender<Event>,
}

impl std::fmt::Debug for ZipDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDownloader")
            .field("creation_url", &self.creation_url.as_str())
            .field("polling", &self.config.polling)
            .finish_non_exhaustive()
    }
}

impl ZipDownloader {
    /// Create a downloader talking to the configured service through `reqwest`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid, or
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ReqwestClient::new(&config.api)?;
        Self::with_client(config, Arc::new(client))
    }

    /// Create a downloader on top of a caller-provided HTTP client
    pub fn with_client(config: Config, client: Arc<dyn HttpClient>) -> Result<Self> {
        config.validate()?;
        let creation_url = config.zip_downloads_url()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            config: Arc::new(config),
            creation_url,
            event_tx,
        })
    }

    /// Subscribe to lifecycle events of every download run through this instance
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create an archive job and stream the finished archive into `sink`
    ///
    /// Uses the configured overall timeout and no cancellation token; see
    /// [`download_with_options`](Self::download_with_options).
    pub async fn download<W>(
        &self,
        name: &str,
        items: &[ArchiveItem],
        sink: &mut W,
    ) -> Result<DownloadStatus>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        self.download_with_options(name, items, sink, DownloadOptions::default())
            .await
    }

    /// Create an archive job, wait for it, and stream the archive into `sink`
    ///
    /// # Returns
    ///
    /// Once the job exists, every outcome is reported through the returned
    /// [`DownloadStatus`]: `Succeeded` when the body was streamed completely,
    /// `TimedOut` when the job was not ready before the overall deadline (no download
    /// request is made, and a creation call still unanswered at the deadline ends
    /// the same way), `Failed` otherwise with the cause in
    /// [`DownloadStatus::error`]. Bytes written before a failure stay in the sink.
    ///
    /// # Errors
    ///
    /// Fails without a status when the job could not be created:
    /// [`Error::InvalidArgument`] (no network call is made),
    /// [`Error::JobCreationFailed`] or [`Error::MalformedResponse`].
    pub async fn download_with_options<W>(
        &self,
        name: &str,
        items: &[ArchiveItem],
        sink: &mut W,
        options: DownloadOptions,
    ) -> Result<DownloadStatus>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let request = ArchiveRequest::build(name, items.to_vec())?;
        let timeout = options.timeout.unwrap_or(self.config.polling.timeout);
        let cancel = options.cancel.unwrap_or_default();
        let deadline = tokio::time::Instant::now() + timeout;

        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(archive = name, "Download cancelled before the job was created");
                return Ok(self.finish(name, DownloadStatus::from_error(Error::Cancelled, 0, None, Vec::new())));
            }
            _ = sleep_until(deadline) => {
                tracing::warn!(archive = name, timeout = ?timeout, "Job creation did not answer before the deadline");
                let error = Error::TimedOut { timeout };
                return Ok(self.finish(name, DownloadStatus::from_error(error, 0, None, Vec::new())));
            }
            job = self.submit(&request) => job?,
        };
        let conflicts = job.name_conflicts().to_vec();

        let mut session = PollSession::new(self, name, &job, deadline, timeout, &cancel);
        let progress = match session.run().await {
            Ok(progress) => progress,
            Err(e) => {
                let status = DownloadStatus::from_error(e, 0, session.last_progress(), conflicts);
                return Ok(self.finish(name, status));
            }
        };

        tracing::info!(archive = name, url = %job.download_url(), "Archive ready, starting download");
        self.emit(Event::DownloadStarted {
            name: name.to_string(),
        });

        let mut written = 0u64;
        let status = match self
            .stream_archive(name, &job, sink, &cancel, &mut written)
            .await
        {
            Ok(()) => DownloadStatus::succeeded(written, Some(progress), conflicts),
            Err(e) => DownloadStatus::from_error(e, written, Some(progress), conflicts),
        };
        Ok(self.finish(name, status))
    }

    /// Log and announce a terminal status, then hand it back
    fn finish(&self, name: &str, status: DownloadStatus) -> DownloadStatus {
        match (status.state(), status.error()) {
            (DownloadState::Succeeded, _) => tracing::info!(
                archive = name,
                bytes = status.total_bytes_written(),
                "Archive download succeeded"
            ),
            (state, Some(error)) => tracing::error!(
                archive = name,
                state = ?state,
                bytes = status.total_bytes_written(),
                error = %error,
                "Archive download did not succeed"
            ),
            (state, None) => tracing::error!(archive = name, state = ?state, "Archive download did not succeed"),
        }

        self.emit(Event::Finished {
            name: name.to_string(),
            state: status.state(),
            total_bytes_written: status.total_bytes_written(),
        });
        status
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

/// Time left before the job's URLs stop working
///
/// Fails with [`Error::JobExpired`] once the expiry instant has been reached, so
/// no request is ever made against an expired job.
pub(crate) fn time_to_expiry(job: &ArchiveJobInfo) -> Result<Duration> {
    job.time_remaining(Utc::now()).ok_or(Error::JobExpired {
        expires_at: job.expires_at(),
    })
}
