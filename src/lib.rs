//! # archive-dl
//!
//! Client for server-assembled zip downloads: ask the service to build an archive
//! from a set of files and folders, wait for the job to finish, then stream the
//! archive into any [`tokio::io::AsyncWrite`] sink.
//!
//! The service assembles the archive itself. This crate drives the job lifecycle:
//!
//! 1. `POST /zip_downloads` with the items and the archive name
//! 2. poll the returned status URL until the job succeeds, fails, or the deadline passes
//! 3. stream the returned download URL into the sink, counting bytes
//!
//! Entries whose names collided are renamed by the service; the renames are exposed
//! as [`ArchiveJobInfo::name_conflicts`] and [`DownloadStatus::name_conflicts`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_dl::{ArchiveItem, Config, DownloadState, ZipDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.access_token = Some("developer-token".to_string());
//!
//!     let downloader = ZipDownloader::new(config)?;
//!     let items = vec![ArchiveItem::file("466239504569"), ArchiveItem::folder("466239504580")];
//!
//!     let mut file = tokio::fs::File::create("bundle.zip").await?;
//!     let status = downloader.download("bundle", &items, &mut file).await?;
//!
//!     match status.state() {
//!         DownloadState::Succeeded => println!("wrote {} bytes", status.total_bytes_written()),
//!         DownloadState::TimedOut => println!("archive was not ready in time"),
//!         DownloadState::Failed => println!("download failed: {:?}", status.error()),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Archive job orchestration
pub mod downloader;
/// Error types
pub mod error;
/// HTTP collaborator interface and reqwest implementation
pub mod http;
/// Job-creation and job-status response parsing
pub mod job;
/// Job-creation request body
pub mod request;
/// Retry classification for status polling
pub mod retry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, PollingConfig};
pub use downloader::ZipDownloader;
pub use error::{Error, Result};
pub use http::{ByteStream, HttpClient, HttpResponse, ReqwestClient, StreamingResponse};
pub use job::{ArchiveJobInfo, ConflictEntry, JobStatus};
pub use request::ArchiveRequest;
pub use types::{
    ArchiveItem, DownloadOptions, DownloadState, DownloadStatus, Event, ItemType, JobProgress,
    JobState,
};
