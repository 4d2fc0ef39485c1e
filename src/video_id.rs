//! Syntactic extraction of video ids from share URLs.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Error;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})")
        .expect("video id pattern is valid")
});

/// Extract the 11-character id from a `youtube.com/watch?v=` or `youtu.be/` URL.
///
/// Returns `None` for anything else; no network lookup is made.
pub fn extract_video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Like [`extract_video_id`] but classifies blank and unmatched input.
pub fn parse_video_url(url: &str) -> Result<String, Error> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::EmptyUrl);
    }
    extract_video_id(url)
        .map(str::to_owned)
        .ok_or(Error::InvalidUrl)
}
