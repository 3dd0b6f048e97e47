//! Streaming the finished archive into the caller's sink.

use crate::error::{Error, Result};
use crate::job::ArchiveJobInfo;
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::{ZipDownloader, time_to_expiry};

impl ZipDownloader {
    /// Copy the archive body into `sink` chunk by chunk
    ///
    /// `written` is updated after every successful write, so it holds the exact
    /// byte count that reached the sink even when this returns an error. Nothing
    /// already written is rolled back.
    pub(super) async fn stream_archive<W>(
        &self,
        name: &str,
        job: &ArchiveJobInfo,
        sink: &mut W,
        cancel: &CancellationToken,
        written: &mut u64,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        time_to_expiry(job)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.client.get_stream(job.download_url()) => {
                response.map_err(|e| stream_error(0, e))?
            }
        };

        if !response.is_success() {
            return Err(Error::DownloadStream {
                bytes_written: 0,
                reason: format!("service returned HTTP {}", response.status),
                source: None,
            });
        }

        let mut body = response.body;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                next = body.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(stream_error(*written, e)),
                None => break,
            };

            let mut remaining = &chunk[..];
            while !remaining.is_empty() {
                let n = sink
                    .write(remaining)
                    .await
                    .map_err(|e| stream_error(*written, Error::Io(e)))?;
                if n == 0 {
                    return Err(Error::DownloadStream {
                        bytes_written: *written,
                        reason: "sink stopped accepting data".into(),
                        source: None,
                    });
                }
                *written += n as u64;
                remaining = &remaining[n..];
            }

            tracing::trace!(archive = name, chunk = chunk.len(), total = *written, "Wrote archive chunk");
        }

        sink.flush()
            .await
            .map_err(|e| stream_error(*written, Error::Io(e)))?;
        Ok(())
    }
}

fn stream_error(bytes_written: u64, cause: Error) -> Error {
    Error::DownloadStream {
        bytes_written,
        reason: cause.to_string(),
        source: Some(Box::new(cause)),
    }
}
