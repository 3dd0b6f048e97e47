//! Error types for archive-dl
//!
//! Every fallible operation in the crate returns [`Error`]. Errors raised before a
//! job exists (bad arguments, creation failures, unparsable creation responses) are
//! returned directly to the caller. Errors raised after the job exists end the
//! orchestration and are carried inside [`DownloadStatus`](crate::DownloadStatus),
//! where [`Error::terminal_state`] decides which terminal state they map to.

use crate::types::DownloadState;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for archive-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied an unusable argument (empty item list, blank name, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "polling.interval")
        key: Option<String>,
    },

    /// A creation or status response was missing a required field or had an unparsable one
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The job-creation call failed at the transport level or returned a non-2xx status
    #[error("archive job creation failed: {reason}")]
    JobCreationFailed {
        /// HTTP status returned by the service, if a response was received at all
        status: Option<u16>,
        /// What went wrong
        reason: String,
        /// Underlying transport error, if the request never got a response
        #[source]
        source: Option<Box<Error>>,
    },

    /// A request returned a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned by the service
        status: u16,
        /// URL that was requested
        url: String,
    },

    /// Status polling kept failing until the retry bound was exhausted
    #[error("status polling failed after {attempts} attempts: {source}")]
    PollTransport {
        /// Number of consecutive failed poll attempts
        attempts: u32,
        /// The last poll error
        #[source]
        source: Box<Error>,
    },

    /// The service reported that it could not assemble the archive
    #[error("archive job failed on the service side")]
    JobFailed,

    /// The job's URLs stopped being valid before the download could start
    #[error("archive job expired at {expires_at}")]
    JobExpired {
        /// Expiry instant reported by the service
        expires_at: DateTime<Utc>,
    },

    /// The overall deadline elapsed while the job was still being assembled
    #[error("archive job not ready within {timeout:?}")]
    TimedOut {
        /// The overall timeout that was in effect
        timeout: Duration,
    },

    /// Reading the archive body or writing it to the sink failed part-way
    #[error("download stream failed after {bytes_written} bytes: {reason}")]
    DownloadStream {
        /// Bytes that reached the sink before the failure
        bytes_written: u64,
        /// What went wrong
        reason: String,
        /// Read or write error that stopped the stream, if there was one
        #[source]
        source: Option<Box<Error>>,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Terminal download state an orchestration ends in when it stops with this error
    ///
    /// Only an elapsed overall deadline is reported as [`DownloadState::TimedOut`];
    /// everything else, including service-reported failures and expiry, is
    /// [`DownloadState::Failed`].
    pub fn terminal_state(&self) -> DownloadState {
        match self {
            Error::TimedOut { .. } => DownloadState::TimedOut,
            _ => DownloadState::Failed,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Config { .. } => "config_error",
            Error::MalformedResponse(_) => "malformed_response",
            Error::JobCreationFailed { .. } => "job_creation_failed",
            Error::HttpStatus { .. } => "http_status",
            Error::PollTransport { .. } => "poll_transport_error",
            Error::JobFailed => "job_failed",
            Error::JobExpired { .. } => "job_expired",
            Error::TimedOut { .. } => "timed_out",
            Error::DownloadStream { .. } => "download_stream_error",
            Error::Cancelled => "cancelled",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}
