//! Core types and enums for ambatudonlod.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output container requested from the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Video with audio.
    #[default]
    Mp4,
    /// Audio only.
    Mp3,
}

impl Format {
    /// File extension, also the wire value.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Mp4 => "mp4",
            Format::Mp3 => "mp3",
        }
    }

    /// Content type of the converted payload.
    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Mp4 => "video/mp4",
            Format::Mp3 => "audio/mpeg",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Video resolution for mp4 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoQuality {
    #[default]
    P720,
    P480,
    P360,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 3] = [VideoQuality::P720, VideoQuality::P480, VideoQuality::P360];

    /// Wire value (vertical resolution).
    pub fn as_str(self) -> &'static str {
        match self {
            VideoQuality::P720 => "720",
            VideoQuality::P480 => "480",
            VideoQuality::P360 => "360",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VideoQuality::P720 => "720p",
            VideoQuality::P480 => "480p",
            VideoQuality::P360 => "360p",
        }
    }
}

/// Audio bitrate for mp3 output, in kb/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioQuality {
    K320,
    K256,
    K192,
    #[default]
    K128,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 4] = [
        AudioQuality::K320,
        AudioQuality::K256,
        AudioQuality::K192,
        AudioQuality::K128,
    ];

    /// Wire value (bitrate).
    pub fn as_str(self) -> &'static str {
        match self {
            AudioQuality::K320 => "320",
            AudioQuality::K256 => "256",
            AudioQuality::K192 => "192",
            AudioQuality::K128 => "128",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AudioQuality::K320 => "320 kb/s",
            AudioQuality::K256 => "256 kb/s",
            AudioQuality::K192 => "192 kb/s",
            AudioQuality::K128 => "128 kb/s",
        }
    }
}

impl FromStr for VideoQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches('p');
        VideoQuality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unsupported video quality '{s}'")))
    }
}

impl FromStr for AudioQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches("kb/s").trim();
        AudioQuality::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unsupported audio quality '{s}'")))
    }
}

/// Metadata returned by `GET /video-info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VideoInfo {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Length in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Body of `POST /download`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadRequest {
    pub video_id: String,
    pub title: String,
    pub format: Format,
    pub video_quality: Option<String>,
    pub audio_quality: Option<String>,
    pub direct_download: bool,
}

impl DownloadRequest {
    /// Build a request; only the quality matching `format` is sent.
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        format: Format,
        video_quality: VideoQuality,
        audio_quality: AudioQuality,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            format,
            video_quality: (format == Format::Mp4).then(|| video_quality.as_str().to_owned()),
            audio_quality: (format == Format::Mp3).then(|| audio_quality.as_str().to_owned()),
            direct_download: true,
        }
    }

    /// `<title>.<format>` as presented to the user.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.title, self.format)
    }
}

/// Styling class a view attaches to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Success,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Success => "success",
        }
    }
}

/// The single message currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub severity: Severity,
    pub text: String,
}

impl UserMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum Error {
    #[error("no URL given")]
    EmptyUrl,
    #[error("not a recognised video URL")]
    InvalidUrl,
    #[error("no filename given")]
    EmptyTitle,
    #[error("cannot reach server: {0}")]
    NetworkUnreachable(String),
    #[error("rate limited by server")]
    RateLimited,
    #[error("server error: {0}")]
    ServerError(String),
    #[error("video information unavailable")]
    VideoInfoUnavailable,
    #[error("output exists; use --force to overwrite: {}", .0.display())]
    OutputExists(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Classify into the message and severity a view should show.
    pub fn user_message(&self) -> UserMessage {
        let (severity, text) = match self {
            Error::EmptyUrl => (Severity::Error, "Please enter a YouTube URL".to_owned()),
            Error::InvalidUrl => (
                Severity::Error,
                "Invalid YouTube URL. Please enter a valid URL.".to_owned(),
            ),
            Error::EmptyTitle => (Severity::Error, "Please enter a filename".to_owned()),
            Error::NetworkUnreachable(_) => (
                Severity::Error,
                "Cannot connect to server. Make sure the API server is running.".to_owned(),
            ),
            Error::RateLimited => (
                Severity::Warning,
                "Too many requests. Please wait a moment and try again.".to_owned(),
            ),
            Error::ServerError(msg) => (Severity::Error, format!("Error: {msg}")),
            Error::VideoInfoUnavailable => (
                Severity::Error,
                "Could not fetch video information. Please try again.".to_owned(),
            ),
            other => (Severity::Error, format!("Error: {other}")),
        };
        UserMessage { severity, text }
    }
}

/// Render a duration in seconds as `m:ss`.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
