//! Form submission: lookup, download, save, and the messages in between.
//!
//! Every outcome ends in exactly one [`FlowEvent::Message`]. Errors never
//! escape without the progress controller being failed and reset.

use std::path::PathBuf;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::file::PendingDownload;
use crate::progress::{DownloadProgressController, ProgressSnapshot};
use crate::types::{
    AudioQuality, DownloadRequest, Error, Format, UserMessage, VideoInfo, VideoQuality,
};
use crate::video_id::parse_video_url;

/// Updates for whichever front end is watching.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// Indeterminate activity, e.g. while fetching video info.
    Status(String),
    Progress(ProgressSnapshot),
    Message(UserMessage),
}

/// A resolved video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLookup {
    pub video_id: String,
    pub info: VideoInfo,
}

/// What the user filled in on the download step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadForm {
    pub url: String,
    pub title: String,
    pub format: Format,
    pub video_quality: VideoQuality,
    pub audio_quality: AudioQuality,
}

impl DownloadForm {
    /// Local validation; no network involved.
    pub fn validate(&self) -> Result<DownloadRequest, Error> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }
        let video_id = parse_video_url(&self.url)?;
        Ok(DownloadRequest::new(
            video_id,
            title,
            self.format,
            self.video_quality,
            self.audio_quality,
        ))
    }
}

/// Helper to send events; a dropped receiver only means nobody is watching.
fn send_event(sender: &mpsc::UnboundedSender<FlowEvent>, event: FlowEvent) {
    if let Err(e) = sender.send(event) {
        debug!("flow event dropped: {:?}", e.0);
    }
}

pub struct SubmissionFlow {
    client: ApiClient,
    config: ClientConfig,
    linger: bool,
    events: mpsc::UnboundedSender<FlowEvent>,
}

impl SubmissionFlow {
    pub fn new(config: ClientConfig, events: mpsc::UnboundedSender<FlowEvent>) -> Result<Self, Error> {
        Ok(Self {
            client: ApiClient::new(&config)?,
            config,
            linger: false,
            events,
        })
    }

    /// Hold the finished bar on screen before returning to idle.
    pub fn with_linger(mut self, on: bool) -> Self {
        self.linger = on;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn report(&self, message: UserMessage) {
        send_event(&self.events, FlowEvent::Message(message));
    }

    fn emit_progress(&self, progress: &DownloadProgressController) {
        send_event(&self.events, FlowEvent::Progress(progress.snapshot()));
    }

    /// URL step: validate and fetch the video's metadata.
    pub async fn lookup(&self, url: &str) -> Result<VideoLookup, Error> {
        let result: Result<VideoLookup, Error> = async {
            let video_id = parse_video_url(url)?;
            send_event(&self.events, FlowEvent::Status("Fetching video info...".into()));
            let info = self.client.video_info(&video_id).await?;
            Ok(VideoLookup { video_id, info })
        }
        .await;

        if let Err(ref e) = result {
            warn!("lookup failed: {e}");
            self.report(e.user_message());
        }
        result
    }

    /// Download step: request conversion, stream it with progress, save it.
    pub async fn download(&self, form: &DownloadForm) -> Result<PathBuf, Error> {
        let request = match form.validate() {
            Ok(r) => r,
            Err(e) => {
                self.report(e.user_message());
                return Err(e);
            }
        };

        // Refuse an existing target before the backend spends time converting.
        let mut file = match PendingDownload::create(
            &self.config.output_dir,
            &request.title,
            request.format,
            self.config.force,
        ) {
            Ok(f) => f,
            Err(e) => {
                self.report(e.user_message());
                return Err(e);
            }
        };

        let mut progress = DownloadProgressController::new();
        progress.begin_estimation();
        self.emit_progress(&progress);

        let outcome = match self.transfer(&request, &mut progress, &mut file).await {
            Ok(()) => file.persist(),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(path) => {
                progress.complete();
                self.emit_progress(&progress);
                info!("saved {}", path.display());
                self.report(UserMessage::success(format!(
                    "Download complete! File: {}",
                    request.file_name()
                )));
                if self.linger {
                    progress.linger().await;
                    self.emit_progress(&progress);
                }
                Ok(path)
            }
            Err(e) => {
                let message = progress.fail(&e);
                self.emit_progress(&progress);
                self.report(message);
                progress.reset();
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        request: &DownloadRequest,
        progress: &mut DownloadProgressController,
        file: &mut PendingDownload,
    ) -> Result<(), Error> {
        let pending = self.client.start_download(request);
        tokio::pin!(pending);

        let mut body = loop {
            tokio::select! {
                biased;
                response = &mut pending => break response?,
                _ = progress.next_simulated_tick() => {
                    progress.on_simulated_tick();
                    self.emit_progress(progress);
                }
            }
        };
        debug!("headers received, total={} bytes", body.total());

        loop {
            tokio::select! {
                biased;
                chunk = body.next_chunk() => {
                    let Some(chunk) = chunk? else {
                        break;
                    };
                    file.write_chunk(&chunk)?;
                    progress.on_transfer_progress(body.loaded(), body.total());
                    self.emit_progress(progress);
                }
                _ = progress.next_simulated_tick() => {
                    progress.on_simulated_tick();
                    self.emit_progress(progress);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(url: &str, title: &str) -> DownloadForm {
        DownloadForm {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn title_is_checked_before_url() {
        assert!(matches!(form("bad", " ").validate(), Err(Error::EmptyTitle)));
        assert!(matches!(form("bad", "t").validate(), Err(Error::InvalidUrl)));
    }

    #[test]
    fn only_matching_quality_is_sent() {
        let mut f = form("https://youtu.be/dQw4w9WgXcQ", " My Song ");
        f.format = Format::Mp3;
        f.audio_quality = AudioQuality::K320;
        let req = f.validate().unwrap();
        assert_eq!(req.title, "My Song");
        assert_eq!(req.video_quality, None);
        assert_eq!(req.audio_quality.as_deref(), Some("320"));
        assert!(req.direct_download);
        assert_eq!(req.file_name(), "My Song.mp3");
    }

    #[tokio::test]
    async fn invalid_url_reports_without_network() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = ClientConfig::default().with_api_url("http://127.0.0.1:9");
        let flow = SubmissionFlow::new(config, tx).unwrap();
        let err = flow.lookup("https://example.com/video").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl));
        match rx.try_recv().unwrap() {
            FlowEvent::Message(m) => {
                assert_eq!(m.text, "Invalid YouTube URL. Please enter a valid URL.")
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
