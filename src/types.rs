//! Core types and events

use crate::error::Error;
use crate::job::ConflictEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Kind of node included in an archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A single file
    File,
    /// A folder and everything below it
    Folder,
}

/// One file or folder to include in an archive
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveItem {
    id: String,
    #[serde(rename = "type")]
    item_type: ItemType,
}

impl ArchiveItem {
    /// Create an item of the given type
    pub fn new(id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            item_type,
        }
    }

    /// A file item
    pub fn file(id: impl Into<String>) -> Self {
        Self::new(id, ItemType::File)
    }

    /// A folder item
    pub fn folder(id: impl Into<String>) -> Self {
        Self::new(id, ItemType::Folder)
    }

    /// Service identifier of the file or folder
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this is a file or a folder
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }
}

/// Job state as reported by the status endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted but not started
    Pending,
    /// Archive is being assembled
    InProgress,
    /// Archive is ready to download
    Succeeded,
    /// Service gave up assembling the archive
    Failed,
}

impl JobState {
    /// Whether polling can stop at this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Progress metadata reported alongside the job state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Items the archive will contain
    #[serde(default)]
    pub total_count: u64,
    /// Items already added to the archive
    #[serde(default)]
    pub downloaded_count: u64,
    /// Items left out of the archive
    #[serde(default)]
    pub skipped_count: u64,
    /// Files left out of the archive
    #[serde(default)]
    pub skipped_file_count: u64,
    /// Folders left out of the archive
    #[serde(default)]
    pub skipped_folder_count: u64,
}

/// Terminal outcome of a download
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Archive was streamed completely into the sink
    Succeeded,
    /// Something went wrong; see [`DownloadStatus::error`]
    Failed,
    /// The archive was not ready before the overall deadline
    TimedOut,
}

/// Final result of [`ZipDownloader::download`](crate::ZipDownloader::download)
///
/// Built once at the end of a download and never modified afterwards.
#[must_use]
#[derive(Debug)]
pub struct DownloadStatus {
    state: DownloadState,
    total_bytes_written: u64,
    progress: Option<JobProgress>,
    name_conflicts: Vec<Vec<ConflictEntry>>,
    error: Option<Error>,
}

impl DownloadStatus {
    pub(crate) fn succeeded(
        total_bytes_written: u64,
        progress: Option<JobProgress>,
        name_conflicts: Vec<Vec<ConflictEntry>>,
    ) -> Self {
        Self {
            state: DownloadState::Succeeded,
            total_bytes_written,
            progress,
            name_conflicts,
            error: None,
        }
    }

    pub(crate) fn from_error(
        error: Error,
        total_bytes_written: u64,
        progress: Option<JobProgress>,
        name_conflicts: Vec<Vec<ConflictEntry>>,
    ) -> Self {
        Self {
            state: error.terminal_state(),
            total_bytes_written,
            progress,
            name_conflicts,
            error: Some(error),
        }
    }

    /// Terminal state
    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// Bytes written to the sink, including the partial archive of a failed download
    pub fn total_bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Progress metadata from the last successful status poll
    pub fn progress(&self) -> Option<&JobProgress> {
        self.progress.as_ref()
    }

    /// Entries the service renamed inside the archive, grouped by collision
    pub fn name_conflicts(&self) -> &[Vec<ConflictEntry>] {
        &self.name_conflicts
    }

    /// Cause of a `Failed` or `TimedOut` outcome
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Convenience check for `state() == DownloadState::Succeeded`
    pub fn is_success(&self) -> bool {
        self.state == DownloadState::Succeeded
    }
}

/// Per-call overrides for a download
#[derive(Clone, Debug, Default)]
pub struct DownloadOptions {
    /// Overall time allowed for the job to become ready (None = use the configured timeout)
    pub timeout: Option<Duration>,

    /// Token that aborts the download when cancelled
    pub cancel: Option<CancellationToken>,
}

/// Event emitted during the archive job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The service accepted the job
    JobCreated {
        /// Requested archive file name
        name: String,
        /// URL being polled for readiness
        status_url: String,
        /// Instant after which the job URLs stop working
        expires_at: DateTime<Utc>,
        /// Number of name-conflict groups reported
        conflict_groups: usize,
    },

    /// A status poll returned
    StatusPolled {
        /// Requested archive file name
        name: String,
        /// Reported job state
        state: JobState,
        /// Reported progress
        progress: JobProgress,
    },

    /// A status poll failed and will be retried
    PollFailed {
        /// Requested archive file name
        name: String,
        /// Consecutive failure count
        attempt: u32,
        /// Error message
        error: String,
    },

    /// The archive is ready and streaming into the sink has started
    DownloadStarted {
        /// Requested archive file name
        name: String,
    },

    /// The download reached a terminal state
    Finished {
        /// Requested archive file name
        name: String,
        /// Terminal state
        state: DownloadState,
        /// Bytes written to the sink
        total_bytes_written: u64,
    },
}
