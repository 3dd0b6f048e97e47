//! Orchestrator tests against the scripted in-memory HTTP client.

use crate::downloader::test_helpers::{
    Chunk, DOWNLOAD_URL, Reply, STATUS_URL, ScriptedClient, StreamReply, create_test_downloader,
    in_one_hour, job_body, status_body,
};
use crate::error::Error;
use crate::types::{ArchiveItem, DownloadOptions, DownloadState, Event, JobState};
use std::time::Duration;
use tokio_util::sync::CancellationToken;


fn items() -> Vec<ArchiveItem> {
    vec![
        ArchiveItem::file("466239504569"),
        ArchiveItem::folder("466239504580"),
    ]
}

fn ready() -> Reply {
    Reply::Json(200, status_body("succeeded"))
}

fn pending() -> Reply {
    Reply::Json(200, status_body("pending"))
}

fn body(chunks: &[&[u8]]) -> StreamReply {
    StreamReply::Body(
        200,
        chunks.iter().map(|c| Chunk::Data(c.to_vec())).collect(),
    )
}

fn with_timeout(timeout: Duration) -> DownloadOptions {
    DownloadOptions {
        timeout: Some(timeout),
        cancel: None,
    }
}

/// Cancel `token` after `delay` from a background task
fn cancel_after(token: &CancellationToken, delay: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
}
