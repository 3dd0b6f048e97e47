//! Shared test helpers: a scripted HTTP client and job fixtures.

use crate::config::Config;
use crate::downloader::ZipDownloader;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse, StreamingResponse};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub(crate) const STATUS_URL: &str = "https://api.example.test/zip_downloads/29l00nfxDyHOt7RphI9zT_w==nDnZEDjY2S8iEWWCHEEiptFxwoWojjlibZjJ6geuE5xnXENDTPxzgbks/status";
pub(crate) const DOWNLOAD_URL: &str = "https://dl.example.test/2.0/zip_downloads/29l00nfxDyHOt7RphI9zT_w==nDnZEDjY2S8iEWWCHEEiptFxwoWojjlibZjJ6geuE5xnXENDTPxzgbks/content";

/// Canned reply to a buffered request
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// Respond with a status code and JSON body
    Json(u16, serde_json::Value),
    /// Respond with a status code and raw body
    Raw(u16, &'static [u8]),
    /// Fail at the transport level with this I/O error kind
    Fail(std::io::ErrorKind),
    /// Never respond
    Hang,
}

impl Reply {
    async fn resolve(self) -> Result<HttpResponse> {
        match self {
            Reply::Json(status, body) => Ok(HttpResponse {
                status,
                body: Bytes::from(serde_json::to_vec(&body)?),
            }),
            Reply::Raw(status, body) => Ok(HttpResponse {
                status,
                body: Bytes::from_static(body),
            }),
            Reply::Fail(kind) => Err(Error::Io(std::io::Error::from(kind))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// One element of a scripted archive body
#[derive(Clone, Debug)]
pub(crate) enum Chunk {
    /// Deliver these bytes
    Data(Vec<u8>),
    /// Fail the stream with this I/O error kind
    Fail(std::io::ErrorKind),
    /// Stop delivering without ending the stream
    Stall,
}

/// Canned archive download
#[derive(Clone, Debug)]
pub(crate) enum StreamReply {
    /// Respond with a status and a body made of chunks
    Body(u16, Vec<Chunk>),
    /// Fail before any response arrives
    Fail(std::io::ErrorKind),
}

/// Request as seen by the scripted client
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Recorded {
    pub(crate) method: &'static str,
    pub(crate) url: String,
    pub(crate) body: Option<serde_json::Value>,
}

/// In-memory [`HttpClient`] replaying scripted replies
///
/// Status polls consume `polls` in order; once it runs dry every further poll
/// gets `poll_fallback`. Every request is recorded.
pub(crate) struct ScriptedClient {
    create: Mutex<Option<Reply>>,
    polls: Mutex<VecDeque<Reply>>,
    poll_fallback: Reply,
    stream: Mutex<Option<StreamReply>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self {
            create: Mutex::new(Some(Reply::Json(202, job_body(in_one_hour())))),
            polls: Mutex::new(VecDeque::new()),
            poll_fallback: Reply::Json(200, status_body("in_progress")),
            stream: Mutex::new(Some(StreamReply::Body(200, Vec::new()))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on_create(self, reply: Reply) -> Self {
        *self.create.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn on_poll(self, reply: Reply) -> Self {
        self.polls.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn poll_fallback(mut self, reply: Reply) -> Self {
        self.poll_fallback = reply;
        self
    }

    pub(crate) fn on_stream(self, reply: StreamReply) -> Self {
        *self.stream.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn record(&self, method: &'static str, url: &Url, body: Option<&serde_json::Value>) {
        self.requests.lock().unwrap().push(Recorded {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<HttpResponse> {
        self.record("POST", url, Some(body));
        let reply = self
            .create
            .lock()
            .unwrap()
            .take()
            .expect("creation requested more than once");
        reply.resolve().await
    }

    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        self.record("GET", url, None);
        let reply = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.poll_fallback.clone());
        reply.resolve().await
    }

    async fn get_stream(&self, url: &Url) -> Result<StreamingResponse> {
        self.record("STREAM", url, None);
        let reply = self
            .stream
            .lock()
            .unwrap()
            .take()
            .expect("download requested more than once");

        match reply {
            StreamReply::Fail(kind) => Err(Error::Io(std::io::Error::from(kind))),
            StreamReply::Body(status, chunks) => {
                let body = futures::stream::unfold(chunks.into_iter(), |mut chunks| async move {
                    match chunks.next()? {
                        Chunk::Data(data) => Some((Ok(Bytes::from(data)), chunks)),
                        Chunk::Fail(kind) => Some((Err(Error::Io(std::io::Error::from(kind))), chunks)),
                        Chunk::Stall => std::future::pending().await,
                    }
                });
                Ok(StreamingResponse {
                    status,
                    body: Box::pin(body),
                })
            }
        }
    }
}

pub(crate) fn in_one_hour() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(1)
}

/// Creation response with one conflict group
pub(crate) fn job_body(expires_at: DateTime<Utc>) -> serde_json::Value {
    json!({
        "download_url": DOWNLOAD_URL,
        "status_url": STATUS_URL,
        "expires_at": expires_at.to_rfc3339(),
        "name_conflicts": [
            [
                {"id": "100", "type": "file", "original_name": "salary.pdf", "download_name": "aqc823.pdf"},
                {"id": "200", "type": "file", "original_name": "salary.pdf", "download_name": "aci23s.pdf"}
            ]
        ]
    })
}

/// Status response in the given state
pub(crate) fn status_body(state: &str) -> serde_json::Value {
    json!({
        "total_count": 2,
        "downloaded_count": if state == "succeeded" { 2 } else { 0 },
        "skipped_count": 0,
        "skipped_file_count": 0,
        "skipped_folder_count": 0,
        "state": state
    })
}

/// Fast polling settings for tests
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.api.base_url = "https://api.example.test/2.0/".into();
    config.polling.interval = Duration::from_millis(10);
    config.polling.timeout = Duration::from_secs(5);
    config.polling.max_retries = 2;
    config
}

pub(crate) fn create_test_downloader(client: ScriptedClient) -> (ZipDownloader, Arc<ScriptedClient>) {
    let client = Arc::new(client);
    let downloader = ZipDownloader::with_client(test_config(), client.clone()).unwrap();
    (downloader, client)
}
