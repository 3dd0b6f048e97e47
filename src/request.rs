//! Job-creation request body

use crate::error::{Error, Result};
use crate::types::ArchiveItem;
use serde::Serialize;

/// Validated body of a `POST /zip_downloads` call
///
/// Items keep the order they were given in; the service uses it to break ties
/// when it renames colliding entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveRequest {
    items: Vec<ArchiveItem>,
    download_file_name: String,
}

impl ArchiveRequest {
    /// Validate the inputs and build a request
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `items` is empty, if `download_file_name` is
    /// blank, or if an item has a blank id.
    pub fn build(download_file_name: impl Into<String>, items: Vec<ArchiveItem>) -> Result<Self> {
        let download_file_name = download_file_name.into();

        if download_file_name.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "download file name must not be blank".into(),
            ));
        }
        if items.is_empty() {
            return Err(Error::InvalidArgument(
                "an archive needs at least one item".into(),
            ));
        }
        if let Some(position) = items.iter().position(|item| item.id().trim().is_empty()) {
            return Err(Error::InvalidArgument(format!(
                "item {} has a blank id",
                position
            )));
        }

        Ok(Self {
            items,
            download_file_name,
        })
    }

    /// Items in request order
    pub fn items(&self) -> &[ArchiveItem] {
        &self.items
    }

    /// Requested archive file name
    pub fn download_file_name(&self) -> &str {
        &self.download_file_name
    }

    /// JSON body sent to the service
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
