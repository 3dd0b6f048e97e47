//! Retry classification for status polling
//!
//! Job creation is never retried. Status polls are: a transient failure is absorbed
//! and the poll is repeated on the normal polling interval, until a bounded number
//! of consecutive failures has been reached.
//!
//! # Example
//!
//! ```
//! use archive_dl::retry::IsRetryable;
//! use archive_dl::Error;
//!
//! let busy = Error::HttpStatus { status: 503, url: "https://api.example.test/status".into() };
//! assert!(busy.is_retryable());
//! assert!(!Error::JobFailed.is_retryable());
//! ```

use crate::error::Error;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, service busy, connection reset) should return `true`.
/// Permanent failures (malformed body, job failed, expired, cancelled) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Non-2xx statuses arrive as `HttpStatus`, so a reqwest error here never got
            // a usable response (refused, reset, dropped mid-request, timed out)
            Error::Network(e) => e.status().is_none(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::Interrupted
            ),
            // Rate limiting and server-side errors clear up on their own
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Error::InvalidArgument(_)
            | Error::Config { .. }
            | Error::MalformedResponse(_)
            | Error::JobCreationFailed { .. }
            | Error::PollTransport { .. }
            | Error::JobFailed
            | Error::JobExpired { .. }
            | Error::TimedOut { .. }
            | Error::DownloadStream { .. }
            | Error::Cancelled
            | Error::Serialization(_) => false,
        }
    }
}

/// Counts consecutive transient failures against a fixed bound
///
/// `max_retries` is the number of retries allowed after the first failure, so the
/// operation is attempted at most `max_retries + 1` times in a row before giving up.
#[derive(Debug)]
pub(crate) struct RetryBudget {
    max_retries: u32,
    consecutive_failures: u32,
}

impl RetryBudget {
    pub(crate) fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            consecutive_failures: 0,
        }
    }

    /// Forget previous failures after a successful attempt
    pub(crate) fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failure.
    ///
    /// Returns the failure count if the operation may be retried. Non-retryable
    /// errors are handed back unchanged; an exhausted budget wraps the last error
    /// in [`Error::PollTransport`].
    pub(crate) fn absorb(&mut self, error: Error) -> Result<u32, Error> {
        if !error.is_retryable() {
            return Err(error);
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures > self.max_retries {
            return Err(Error::PollTransport {
                attempts: self.consecutive_failures,
                source: Box::new(error),
            });
        }
        Ok(self.consecutive_failures)
    }
}
