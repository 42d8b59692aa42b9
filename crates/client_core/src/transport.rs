use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{
    multipart::{Form, Part},
    Body, Client,
};
use shared::{
    domain::AnalysisResult,
    error::ServerErrorBody,
    protocol::{HealthResponse, ANALYZE_PATH, CSV_MIME_TYPE, HEALTH_PATH, UPLOAD_FIELD_NAME},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::ClientSettings, error::UploadError};

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl TransferProgress {
    /// `round(bytes_sent * 100 / total_bytes)`, capped at 100. `None` when the
    /// total is unknown.
    pub fn percent(&self) -> Option<u8> {
        if self.total_bytes == 0 {
            return None;
        }
        let sent = u128::from(self.bytes_sent.min(self.total_bytes));
        let total = u128::from(self.total_bytes);
        let rounded = (sent * 100 + total / 2) / total;
        Some(rounded.min(100) as u8)
    }
}

/// Side channel receiving transfer progress while an upload is in flight.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: TransferProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(TransferProgress) + Send + Sync,
{
    fn on_progress(&self, progress: TransferProgress) {
        self(progress)
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _progress: TransferProgress) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One file picked by the user, either by drop or by the browse dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Bytes(bytes),
        }
    }

    pub async fn read_bytes(self) -> Result<Vec<u8>, UploadError> {
        match self.source {
            FileSource::Bytes(bytes) => Ok(bytes),
            FileSource::Path(path) => tokio::fs::read(&path).await.map_err(|err| {
                UploadError::RequestSetup(format!("failed to read '{}': {err}", path.display()))
            }),
        }
    }
}

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Sends one file and resolves to the decoded payload or a classified error.
    async fn analyze(
        &self,
        file: SelectedFile,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<AnalysisResult, UploadError>;
}

pub struct HttpAnalysisClient {
    http: Client,
    server_url: Url,
}

impl HttpAnalysisClient {
    pub fn new(server_url: &str) -> Result<Self, UploadError> {
        Self::from_settings(&ClientSettings {
            server_url: server_url.to_string(),
            ..ClientSettings::default()
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, UploadError> {
        let server_url = settings
            .server_base_url()
            .map_err(|err| UploadError::RequestSetup(format!("{err:#}")))?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|err| UploadError::RequestSetup(format!("failed to build http client: {err}")))?;
        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Resolves `path` below the configured base, keeping any base path prefix.
    fn endpoint(&self, path: &str) -> Result<Url, UploadError> {
        let mut base = self.server_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/')).map_err(|err| {
            UploadError::RequestSetup(format!("invalid endpoint '{path}' for {base}: {err}"))
        })
    }

    pub async fn health(&self) -> Result<HealthResponse, UploadError> {
        let endpoint = self.endpoint(HEALTH_PATH)?;
        let response = self
            .http
            .get(endpoint)
            .send()
            .await
            .map_err(classify_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let raw = response.bytes().await.unwrap_or_default();
            return Err(UploadError::server_rejected(
                status.as_u16(),
                ServerErrorBody::detail_from_bytes(&raw),
            ));
        }
        decode_success_body(status.as_u16(), response).await
    }
}

#[async_trait]
impl AnalysisTransport for HttpAnalysisClient {
    async fn analyze(
        &self,
        file: SelectedFile,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<AnalysisResult, UploadError> {
        let endpoint = self.endpoint(ANALYZE_PATH)?;
        let file_name = file.name.clone();
        let bytes = file.read_bytes().await?;
        let total_bytes = bytes.len() as u64;

        let part = Part::stream_with_length(progress_body(bytes, progress), total_bytes)
            .file_name(file_name.clone())
            .mime_str(CSV_MIME_TYPE)
            .map_err(|err| UploadError::RequestSetup(format!("invalid upload part: {err}")))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        info!(file = %file_name, total_bytes, endpoint = %endpoint, "uploading dataset for analysis");
        let response = self
            .http
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.bytes().await.unwrap_or_default();
            return Err(UploadError::server_rejected(
                status.as_u16(),
                ServerErrorBody::detail_from_bytes(&raw),
            ));
        }

        let result: AnalysisResult = decode_success_body(status.as_u16(), response).await?;
        debug!(
            problem_type = %result.problem_type,
            metrics = result.metrics.len(),
            features = result.feature_importances.len(),
            plots = result.plots.len(),
            "analysis payload decoded"
        );
        Ok(result)
    }
}

/// Streams `bytes` in fixed chunks, reporting cumulative progress as the
/// transport pulls each chunk.
fn progress_body(bytes: Vec<u8>, progress: Arc<dyn ProgressSink>) -> Body {
    let total_bytes = bytes.len() as u64;
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_BYTES).map(<[u8]>::to_vec).collect();
    let mut bytes_sent = 0u64;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        bytes_sent += chunk.len() as u64;
        progress.on_progress(TransferProgress {
            bytes_sent,
            total_bytes,
        });
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}

/// Builder failures happen before any I/O; everything else means the
/// request went out and no usable response came back.
fn classify_send_error(err: reqwest::Error) -> UploadError {
    if err.is_builder() {
        UploadError::RequestSetup(err.to_string())
    } else {
        UploadError::NoResponse(format!("{err:?}"))
    }
}

async fn decode_success_body<T: serde::de::DeserializeOwned>(
    status: u16,
    response: reqwest::Response,
) -> Result<T, UploadError> {
    response.json::<T>().await.map_err(|err| {
        warn!(status, "unusable success response from analysis service: {err:?}");
        if err.is_decode() {
            UploadError::server_rejected(status, None)
        } else {
            UploadError::NoResponse(format!("response body interrupted: {err:?}"))
        }
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
