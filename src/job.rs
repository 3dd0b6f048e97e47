//! Parsing of job-creation and job-status responses
//!
//! Both parsers are pure: they only look at the JSON they are given.

use crate::error::{Error, Result};
use crate::types::{JobProgress, JobState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// One item the service renamed because its name collided with another item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    /// Service identifier of the item
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Name the item has in the content store
    pub original_name: String,
    /// Name the item was given inside the archive
    pub download_name: String,
}

/// Handle on a server-side archive job, returned by a successful creation call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveJobInfo {
    download_url: Url,
    status_url: Url,
    expires_at: DateTime<Utc>,
    name_conflicts: Vec<Vec<ConflictEntry>>,
}

#[derive(Deserialize)]
struct RawJobInfo {
    download_url: Option<String>,
    status_url: Option<String>,
    expires_at: Option<String>,
    #[serde(default)]
    name_conflicts: Option<Vec<Vec<ConflictEntry>>>,
}

impl ArchiveJobInfo {
    /// Parse a creation response body
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] if `download_url`, `status_url` or `expires_at`
    /// is missing or unparsable, if a conflict entry lacks a field, or if a conflict
    /// group has fewer than two entries. A missing `name_conflicts` is not an error.
    pub fn parse(body: &serde_json::Value) -> Result<Self> {
        let raw = RawJobInfo::deserialize(body)
            .map_err(|e| Error::MalformedResponse(format!("creation response: {}", e)))?;

        let download_url = parse_url("download_url", raw.download_url)?;
        let status_url = parse_url("status_url", raw.status_url)?;

        let expires_at = raw
            .expires_at
            .ok_or_else(|| missing("expires_at"))
            .and_then(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        Error::MalformedResponse(format!("expires_at '{}': {}", value, e))
                    })
            })?;

        let name_conflicts = raw.name_conflicts.unwrap_or_default();
        if let Some(index) = name_conflicts.iter().position(|group| group.len() < 2) {
            return Err(Error::MalformedResponse(format!(
                "name conflict group {} has fewer than two entries",
                index
            )));
        }

        Ok(Self {
            download_url,
            status_url,
            expires_at,
            name_conflicts,
        })
    }

    /// Parse a creation response from raw bytes
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::MalformedResponse(format!("creation response is not JSON: {}", e)))?;
        Self::parse(&value)
    }

    /// URL the finished archive is streamed from
    pub fn download_url(&self) -> &Url {
        &self.download_url
    }

    /// URL reporting the job state
    pub fn status_url(&self) -> &Url {
        &self.status_url
    }

    /// Instant after which both URLs stop working
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Groups of items that collided on name, each with its assigned download name
    pub fn name_conflicts(&self) -> &[Vec<ConflictEntry>] {
        &self.name_conflicts
    }

    /// Whether the job's URLs are no longer valid at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before the job expires, or `None` if it already has
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at - now)
            .to_std()
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }
}

/// Parsed body of a `GET <status_url>` call
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct JobStatus {
    /// Reported job state
    pub state: JobState,
    /// Reported progress counters
    #[serde(flatten)]
    pub progress: JobProgress,
}

impl JobStatus {
    /// Parse a status response body
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] if the body is not JSON or `state` is missing or unknown.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| Error::MalformedResponse(format!("status response: {}", e)))
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedResponse(format!("creation response is missing '{}'", field))
}

fn parse_url(field: &str, value: Option<String>) -> Result<Url> {
    let value = value.ok_or_else(|| missing(field))?;
    Url::parse(&value).map_err(|e| Error::MalformedResponse(format!("{} '{}': {}", field, value, e)))
}

// Item ids are strings on the wire, but some responses carry them as numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
