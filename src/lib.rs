#![forbid(unsafe_code)]
//! # ambatudonlod: fetch videos as MP4 or audio as MP3 from a conversion backend.
//!
//! `ambatudonlod` is the client half of a small download service. The backend
//! resolves video URLs and transcodes them; this crate validates input, talks
//! to the backend's two endpoints, reports progress and saves the result.
//!
//! ## Features
//! - **URL validation**: share links are checked locally before any request
//! - **Phased progress**: a simulated pre-phase while the server converts, then
//!   real byte counts mapped onto the rest of the bar
//! - **Scramble-reveal text**: the heading animation used by both front ends,
//!   driven by a pure state machine
//! - **Atomic saves** of `<title>.<format>`
//!
//! ## Example: Validate and download
//! ```no_run
//! use ambatudonlod::{ClientConfig, DownloadForm, Format, SubmissionFlow};
//!
//! # async fn run() -> Result<(), ambatudonlod::Error> {
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
//! let flow = SubmissionFlow::new(ClientConfig::from_env(), tx)?;
//! let url = "https://youtu.be/dQw4w9WgXcQ";
//! let found = flow.lookup(url).await?;
//! let form = DownloadForm {
//!     url: url.into(),
//!     title: found.info.title,
//!     format: Format::Mp3,
//!     ..Default::default()
//! };
//! let saved = flow.download(&form).await?;
//! println!("{}", saved.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Drive a reveal by hand
//! ```
//! use ambatudonlod::{RevealOptions, RevealScheduler};
//!
//! let mut reveal = RevealScheduler::new("hello", RevealOptions::default()).unwrap();
//! reveal.start();
//! while reveal.is_running() {
//!     reveal.tick();
//! }
//! assert_eq!(reveal.frame(), "hello");
//! ```

mod client;
mod config;
mod file;
mod flow;
mod progress;
mod reveal;
mod trigger;
mod types;
mod video_id;

// Re-export public API from modules
pub use types::*;
pub use client::{ApiClient, DownloadBody};
pub use config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT};
pub use file::{PendingDownload, output_path, sanitize_title, save_download};
pub use flow::{DownloadForm, FlowEvent, SubmissionFlow, VideoLookup};
pub use progress::{
    DownloadProgressController, ESTIMATE_CEILING, ESTIMATE_INTERVAL, Phase, ProgressSnapshot,
    RESET_DELAY, TRANSFER_CEILING,
};
pub use reveal::{
    DEFAULT_CHARACTERS, GlyphSource, RandomGlyphs, RevealDirection, RevealHandle, RevealOptions,
    RevealScheduler, RevealState, spawn_reveal,
};
pub use trigger::{AnimateOn, OneShot, Repeatable, Trigger, TriggerSet, VISIBILITY_THRESHOLD};
pub use video_id::{extract_video_id, parse_video_url};
