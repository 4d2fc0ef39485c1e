mod app;
mod operations;
mod progress;
mod widgets;

pub use app::AmbatudonlodApp;

#[cfg(test)]
mod tests {
    use crate::gui::app::{AppStep, thumbnail_image};
    use crate::gui::progress::ProgressState;
    use ambatudonlod::{Phase, ProgressSnapshot, VideoInfo};

    #[test]
    fn test_app_step_default() {
        assert_eq!(AppStep::default(), AppStep::Url);
    }

    #[test]
    fn test_progress_state() {
        let mut progress = ProgressState::default();
        assert!(!progress.is_running());

        progress.start("Fetching video info...");
        assert!(progress.is_running());
        assert_eq!(progress.fraction(), None);

        progress.update(ProgressSnapshot {
            phase: Phase::Transferring,
            percent: 64,
            message: "Downloading".into(),
            ..Default::default()
        });
        assert_eq!(progress.message, "Downloading");
        assert_eq!(progress.fraction(), Some(0.64));

        progress.update(ProgressSnapshot::default());
        assert_eq!(progress.fraction(), None);

        progress.reset();
        assert!(!progress.is_running());
    }

    #[test]
    fn test_thumbnail_preview() {
        let mut info = VideoInfo {
            success: true,
            title: "Clip".into(),
            thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".into()),
            duration: Some(212),
        };
        assert_eq!(
            thumbnail_image(&info).unwrap().uri(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
        );

        info.thumbnail = Some("  ".into());
        assert!(thumbnail_image(&info).is_none());
        info.thumbnail = None;
        assert!(thumbnail_image(&info).is_none());
    }
}
