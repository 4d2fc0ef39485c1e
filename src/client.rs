//! HTTP access to the conversion backend.

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use log::debug;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::types::{DownloadRequest, Error, VideoInfo};

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Thin wrapper over the two backend endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            base: config.api_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `GET /video-info`.
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo, Error> {
        let url = format!("{}/video-info", self.base);
        debug!("GET {url} video_id={video_id}");
        let response = self
            .http
            .get(&url)
            .query(&[("video_id", video_id)])
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let info: VideoInfo = response.json().await.map_err(transport_error)?;
        if !info.success {
            return Err(Error::VideoInfoUnavailable);
        }
        Ok(info)
    }

    /// `POST /download`; resolves once the response headers arrive.
    pub async fn start_download(&self, request: &DownloadRequest) -> Result<DownloadBody, Error> {
        let url = format!("{}/download", self.base);
        debug!("POST {url} {}", request.file_name());
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let expected = request.format.mime_type();
        if let Some(ct) = content_type.as_deref()
            && !ct.starts_with(expected)
        {
            debug!("unexpected content type {ct}, expected {expected}");
        }

        Ok(DownloadBody {
            total: response.content_length().unwrap_or(0),
            content_type,
            loaded: 0,
            stream: response.bytes_stream().boxed(),
        })
    }
}

/// The streaming body of a successful download.
pub struct DownloadBody {
    total: u64,
    content_type: Option<String>,
    loaded: u64,
    stream: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl DownloadBody {
    /// Expected length; 0 when the server did not say.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Bytes handed out so far.
    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Next chunk of the body, `Ok(None)` at the end.
    ///
    /// Cancel safe: dropping the future loses no data.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self.stream.next().await {
            Some(Ok(chunk)) => {
                self.loaded += chunk.len() as u64;
                Ok(Some(chunk))
            }
            Some(Err(e)) => Err(transport_error(e)),
            None => Ok(None),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
    Err(Error::ServerError(message))
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::NetworkUnreachable(e.to_string())
    } else {
        Error::ServerError(e.to_string())
    }
}
