//! Status polling until the service finishes assembling the archive.

use crate::error::{Error, Result};
use crate::job::{ArchiveJobInfo, JobStatus};
use crate::retry::RetryBudget;
use crate::types::{Event, JobProgress, JobState};
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

use super::{ZipDownloader, time_to_expiry};

/// Polling state for one job
///
/// Polls are strictly sequential. Every wait (the poll request itself and the pause
/// between polls) also watches the cancellation token, the overall deadline and the
/// job expiry, so whichever comes first ends the wait.
pub(super) struct PollSession<'a> {
    downloader: &'a ZipDownloader,
    name: &'a str,
    job: &'a ArchiveJobInfo,
    deadline: Instant,
    timeout: Duration,
    cancel: &'a CancellationToken,
    last_progress: Option<JobProgress>,
}

impl<'a> PollSession<'a> {
    pub(super) fn new(
        downloader: &'a ZipDownloader,
        name: &'a str,
        job: &'a ArchiveJobInfo,
        deadline: Instant,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            downloader,
            name,
            job,
            deadline,
            timeout,
            cancel,
            last_progress: None,
        }
    }

    /// Progress reported by the most recent successful poll
    pub(super) fn last_progress(&self) -> Option<JobProgress> {
        self.last_progress
    }

    /// Poll until the job succeeds
    ///
    /// The first poll is issued immediately; later polls follow the configured
    /// interval. Transient failures are absorbed by a [`RetryBudget`] that resets on
    /// every successful poll.
    ///
    /// # Errors
    ///
    /// [`Error::JobFailed`] if the service reports failure, [`Error::TimedOut`] when
    /// the deadline passes, [`Error::JobExpired`], [`Error::Cancelled`],
    /// [`Error::PollTransport`] once the retry budget is exhausted, or the
    /// non-retryable poll error itself.
    pub(super) async fn run(&mut self) -> Result<JobProgress> {
        let polling = &self.downloader.config.polling;
        let mut budget = RetryBudget::new(polling.max_retries);

        loop {
            match self.poll_once().await {
                Ok(status) => {
                    budget.reset();
                    self.last_progress = Some(status.progress);

                    tracing::debug!(
                        archive = self.name,
                        state = ?status.state,
                        downloaded = status.progress.downloaded_count,
                        total = status.progress.total_count,
                        "Polled archive job status"
                    );
                    self.downloader.emit(Event::StatusPolled {
                        name: self.name.to_string(),
                        state: status.state,
                        progress: status.progress,
                    });

                    match status.state {
                        JobState::Succeeded => return Ok(status.progress),
                        JobState::Failed => return Err(Error::JobFailed),
                        JobState::Pending | JobState::InProgress => {}
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    let attempt = budget.absorb(e)?;

                    tracing::warn!(
                        archive = self.name,
                        error = %message,
                        attempt = attempt,
                        max_retries = polling.max_retries,
                        "Status poll failed, retrying"
                    );
                    self.downloader.emit(Event::PollFailed {
                        name: self.name.to_string(),
                        attempt,
                        error: message,
                    });
                }
            }

            self.pause(polling.interval).await?;
        }
    }

    /// Issue one status request
    async fn poll_once(&self) -> Result<JobStatus> {
        let until_expiry = time_to_expiry(self.job)?;
        let url = self.job.status_url();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(self.deadline) => Err(self.timed_out()),
            _ = sleep(until_expiry) => Err(self.expired()),
            response = self.downloader.client.get(url) => {
                let response = response?;
                if response.is_success() {
                    JobStatus::from_slice(&response.body)
                } else {
                    Err(Error::HttpStatus {
                        status: response.status,
                        url: url.to_string(),
                    })
                }
            }
        }
    }

    /// Wait out the polling interval
    async fn pause(&self, interval: Duration) -> Result<()> {
        let until_expiry = time_to_expiry(self.job)?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep_until(self.deadline) => Err(self.timed_out()),
            _ = sleep(until_expiry) => Err(self.expired()),
            _ = sleep(interval) => Ok(()),
        }
    }

    fn timed_out(&self) -> Error {
        Error::TimedOut {
            timeout: self.timeout,
        }
    }

    fn expired(&self) -> Error {
        Error::JobExpired {
            expires_at: self.job.expires_at(),
        }
    }
}
