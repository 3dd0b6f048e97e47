//! Job-creation call.

use crate::error::{Error, Result};
use crate::job::ArchiveJobInfo;
use crate::request::ArchiveRequest;
use crate::types::{ArchiveItem, Event};

use super::ZipDownloader;

impl ZipDownloader {
    /// Ask the service to assemble `items` into an archive named `name`
    ///
    /// Issues exactly one `POST /zip_downloads`. The call is never retried here;
    /// transport retries belong to the [`HttpClient`](crate::HttpClient).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the request does not validate (nothing is sent)
    /// - [`Error::JobCreationFailed`] on a transport error or a non-2xx status
    /// - [`Error::MalformedResponse`] if the accepted response cannot be parsed
    pub async fn create(&self, name: &str, items: &[ArchiveItem]) -> Result<ArchiveJobInfo> {
        let request = ArchiveRequest::build(name, items.to_vec())?;
        self.submit(&request).await
    }

    /// Send an already validated creation request
    pub(super) async fn submit(&self, request: &ArchiveRequest) -> Result<ArchiveJobInfo> {
        let name = request.download_file_name();
        let body = request.to_json()?;

        tracing::debug!(
            archive = name,
            items = request.items().len(),
            url = %self.creation_url,
            "Creating archive job"
        );

        let response = self
            .client
            .post_json(&self.creation_url, &body)
            .await
            .map_err(|e| {
                tracing::error!(archive = name, error = %e, "Archive job creation request failed");
                Error::JobCreationFailed {
                    status: None,
                    reason: e.to_string(),
                    source: Some(Box::new(e)),
                }
            })?;

        if !response.is_success() {
            let reason = service_message(&response.body)
                .unwrap_or_else(|| format!("service returned HTTP {}", response.status));
            tracing::error!(
                archive = name,
                status = response.status,
                reason = %reason,
                "Archive job creation rejected"
            );
            return Err(Error::JobCreationFailed {
                status: Some(response.status),
                reason,
                source: None,
            });
        }

        let job = ArchiveJobInfo::from_slice(&response.body)?;

        tracing::info!(
            archive = name,
            status_url = %job.status_url(),
            expires_at = %job.expires_at(),
            conflict_groups = job.name_conflicts().len(),
            "Archive job created"
        );
        self.emit(Event::JobCreated {
            name: name.to_string(),
            status_url: job.status_url().to_string(),
            expires_at: job.expires_at(),
            conflict_groups: job.name_conflicts().len(),
        });

        Ok(job)
    }
}

/// Extract the service's own explanation from an error body, if it sent one
///
/// Error bodies look like `{"type": "error", "code": "...", "message": "..."}`.
fn service_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?;
    Some(match value.get("code").and_then(|code| code.as_str()) {
        Some(code) => format!("{}: {}", code, message),
        None => message.to_string(),
    })
}
