use std::sync::{mpsc, Arc};
use std::time::Duration;

use bytes::Bytes;
use composer_logging::{composer_debug, composer_warn};
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use url::Url;

use crate::{EngineEvent, UploadError, UploadFailureKind, UploadFile, UploadId, UploadProgress};

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Base of the storage REST API, e.g. `https://firebasestorage.googleapis.com`.
    pub endpoint: String,
    pub bucket: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    /// Size of the body chunks; one progress report per chunk at most.
    pub chunk_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://firebasestorage.googleapis.com".to_string(),
            bucket: String::new(),
            auth_token: None,
            connect_timeout: Duration::from_secs(10),
            chunk_bytes: 64 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Uploads one object and resolves to its download URL.
///
/// Progress is reported through `sink` while the body streams. An upload
/// cannot be cancelled or resumed once started.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        upload_id: UploadId,
        object_name: &str,
        file: UploadFile,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<String, UploadError>;
}

/// Object key for an upload: milliseconds since the epoch followed by the
/// original file name.
pub fn object_name(unix_millis: i64, file_name: &str) -> String {
    format!("{unix_millis}{file_name}")
}

/// `{endpoint}/v0/b/{bucket}/o/{name}?alt=media&token={token}` with the
/// object name encoded as a single path segment.
pub fn download_url(
    endpoint: &str,
    bucket: &str,
    object_name: &str,
    token: Option<&str>,
) -> Result<String, UploadError> {
    let mut url = object_url(endpoint, bucket)?;
    url.path_segments_mut()
        .map_err(|_| UploadError::new(UploadFailureKind::InvalidEndpoint, endpoint))?
        .push(object_name);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("alt", "media");
        if let Some(token) = token {
            query.append_pair("token", token);
        }
    }
    Ok(url.to_string())
}

fn object_url(endpoint: &str, bucket: &str) -> Result<Url, UploadError> {
    let mut url = Url::parse(endpoint)
        .map_err(|err| UploadError::new(UploadFailureKind::InvalidEndpoint, err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| UploadError::new(UploadFailureKind::InvalidEndpoint, endpoint))?
        .pop_if_empty()
        .extend(["v0", "b", bucket, "o"]);
    Ok(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredObject {
    name: String,
    /// Comma separated; the first token is used.
    download_tokens: Option<String>,
}

/// Turns bytes handed to the transport into monotonic whole percentages,
/// emitting only when the value changes.
struct ProgressTracker {
    upload_id: UploadId,
    total: u64,
    sent: u64,
    last: Option<u8>,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressTracker {
    fn new(upload_id: UploadId, total: u64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            upload_id,
            total,
            sent: 0,
            last: None,
            sink,
        }
    }

    fn advance(&mut self, len: u64) {
        self.sent = (self.sent + len).min(self.total);
        let percent = if self.total == 0 {
            100
        } else {
            (self.sent * 100 / self.total) as u8
        };
        if self.last.is_some_and(|last| last >= percent) {
            return;
        }
        self.last = Some(percent);
        self.sink.emit(EngineEvent::Progress(UploadProgress {
            upload_id: self.upload_id,
            percent,
        }));
    }
}

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    settings: StorageSettings,
}

impl HttpObjectStore {
    pub fn new(settings: StorageSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, UploadError> {
        // No request timeout: a slow upload is left to finish or fail on its own.
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| UploadError::new(UploadFailureKind::Network, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        upload_id: UploadId,
        object_name: &str,
        file: UploadFile,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<String, UploadError> {
        let mut target = object_url(&self.settings.endpoint, &self.settings.bucket)?;
        target.query_pairs_mut().append_pair("name", object_name);
        let client = self.build_client()?;

        let data = Bytes::from(file.data);
        let chunk_bytes = self.settings.chunk_bytes.max(1);
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(chunk_bytes)
            .map(|start| data.slice(start..(start + chunk_bytes).min(data.len())))
            .collect();

        let mut tracker = ProgressTracker::new(upload_id, data.len() as u64, sink);
        tracker.advance(0);
        let body = futures_util::stream::iter(chunks).map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let content_type = file
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let mut request = client
            .post(target)
            .header(CONTENT_TYPE, content_type)
            .body(reqwest::Body::wrap_stream(body));
        if let Some(token) = &self.settings.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        composer_debug!("Upload {} sending object {}", upload_id, object_name);
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::PAYLOAD_TOO_LARGE {
            return Err(UploadError::new(UploadFailureKind::TooLarge, status.to_string()));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            composer_warn!("Upload {} rejected with {}: {}", upload_id, status, detail);
            return Err(UploadError::new(
                UploadFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let raw = response.bytes().await.map_err(map_reqwest_error)?;
        let stored: StoredObject = serde_json::from_slice(&raw)
            .map_err(|err| UploadError::new(UploadFailureKind::InvalidResponse, err.to_string()))?;
        let token = stored
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()));

        download_url(
            &self.settings.endpoint,
            &self.settings.bucket,
            &stored.name,
            token,
        )
    }
}

fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    UploadError::new(UploadFailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u8>>);

    impl ProgressSink for Recorder {
        fn emit(&self, event: EngineEvent) {
            if let EngineEvent::Progress(progress) = event {
                self.0.lock().unwrap().push(progress.percent);
            }
        }
    }

    #[test]
    fn tracker_reports_each_new_percentage_once() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(1, 300, recorder.clone());
        tracker.advance(0);
        tracker.advance(1);
        tracker.advance(149);
        tracker.advance(150);
        tracker.advance(10);

        assert_eq!(*recorder.0.lock().unwrap(), vec![0, 50, 100]);
    }

    #[test]
    fn empty_file_reports_complete() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(1, 0, recorder.clone());
        tracker.advance(0);

        assert_eq!(*recorder.0.lock().unwrap(), vec![100]);
    }

    #[test]
    fn download_url_encodes_object_name_as_one_segment() {
        let url = download_url(
            "https://store.example/",
            "blog-app",
            "1700000000000my cat/1.png",
            Some("tok"),
        )
        .unwrap();

        assert_eq!(
            url,
            "https://store.example/v0/b/blog-app/o/1700000000000my%20cat%2F1.png?alt=media&token=tok"
        );
    }

    #[test]
    fn object_name_prefixes_timestamp() {
        assert_eq!(object_name(1_700_000_000_123, "cat.png"), "1700000000123cat.png");
    }
}
