//! Client configuration shared by the CLI and the GUI.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the backend base URL.
pub const API_URL_ENV: &str = "AMBATUDONLOD_API_URL";
/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// Connect timeout for backend requests. Conversion can take minutes, so the
/// request itself is not bounded.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to talk to and where to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without trailing slash.
    pub api_url: String,
    /// Directory that receives `<title>.<format>`.
    pub output_dir: PathBuf,
    /// Overwrite an existing output file.
    pub force: bool,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            output_dir: PathBuf::from("."),
            force: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the API URL taken from [`API_URL_ENV`] when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            config = config.with_api_url(url);
        }
        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_force(mut self, on: bool) -> Self {
        self.force = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = ClientConfig::default().with_api_url("http://api.local:8080/ ");
        assert_eq!(c.api_url, "http://api.local:8080");
    }
}
