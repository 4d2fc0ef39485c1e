use eframe::egui;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::gui::operations::{Operation, OperationMessage};
use crate::gui::progress::ProgressState;
use crate::gui::widgets::{DecryptedText, folder_picker_button};

use ambatudonlod::{
    AnimateOn, AudioQuality, ClientConfig, DownloadForm, FlowEvent, Format, RevealDirection,
    RevealOptions, Severity, UserMessage, VideoInfo, VideoLookup, VideoQuality, format_duration,
};

/// Preview image for the video card, loaded by the installed image loaders.
pub(crate) fn thumbnail_image(info: &VideoInfo) -> Option<egui::Image<'_>> {
    info.thumbnail
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .map(|uri| egui::Image::from_uri(uri).max_width(240.0))
}

#[derive(Default)]
pub struct AmbatudonlodApp {
    // Current step
    step: AppStep,

    // Form
    video_url: String,
    title: String,
    format: Format,
    video_quality: VideoQuality,
    audio_quality: AudioQuality,
    lookup: Option<VideoLookup>,

    // Output options
    config: ClientConfig,

    // Heading
    heading: Option<DecryptedText>,

    // Progress and results
    progress: ProgressState,
    message: Option<UserMessage>,

    // Runtime state
    operation_handle: Option<tokio::task::JoinHandle<()>>,
    result_receiver: Option<mpsc::UnboundedReceiver<OperationMessage>>,
    runtime: Option<Arc<tokio::runtime::Runtime>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AppStep {
    #[default]
    Url,
    Download,
}

impl AmbatudonlodApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let runtime = Arc::new(
            tokio::runtime::Runtime::new()
                .expect("Failed to create Tokio runtime")
        );

        let heading = DecryptedText::new(
            "Ambatudonlod",
            AnimateOn::Both,
            RevealOptions::default().with_direction(RevealDirection::Start),
        );
        if let Err(ref e) = heading {
            log::warn!("heading animation disabled: {e}");
        }

        Self {
            runtime: Some(runtime),
            config: ClientConfig::from_env(),
            heading: heading.ok(),
            ..Default::default()
        }
    }
}

impl eframe::App for AmbatudonlodApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle incoming messages from operations
        self.handle_operation_messages();

        // Request repaint if operation is running
        if self.progress.is_running() {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_ui(ui);
        });
    }
}

impl AmbatudonlodApp {
    fn draw_ui(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            if let Some(ref mut heading) = self.heading {
                let _ = heading.show(ui, egui::FontId::monospace(32.0));
            } else {
                ui.heading("Ambatudonlod");
            }
            ui.label("Download videos as MP4 or extract audio as MP3");
        });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        match self.step {
            AppStep::Url => self.draw_url_ui(ui),
            AppStep::Download => self.draw_download_ui(ui),
        }

        ui.add_space(20.0);

        self.draw_progress_ui(ui);
        self.draw_message_ui(ui);
    }

    fn draw_url_ui(&mut self, ui: &mut egui::Ui) {
        let busy = self.progress.is_running();

        ui.horizontal(|ui| {
            ui.label("YouTube URL:");
            ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut self.video_url)
                    .hint_text("https://www.youtube.com/watch?v=...")
                    .desired_width(360.0),
            );
        });

        ui.add_space(15.0);

        let label = if busy { "Fetching video..." } else { "Next" };
        if ui
            .add_enabled(!busy, egui::Button::new(label).min_size(egui::vec2(120.0, 30.0)))
            .clicked()
        {
            self.start_lookup_operation();
        }
    }

    fn draw_download_ui(&mut self, ui: &mut egui::Ui) {
        let busy = self.progress.is_running();

        if let Some(ref found) = self.lookup {
            ui.group(|ui| {
                ui.set_width(ui.available_width());
                if let Some(image) = thumbnail_image(&found.info) {
                    ui.add(image);
                }
                ui.label(egui::RichText::new(&found.info.title).strong());
                if let Some(secs) = found.info.duration {
                    ui.label(format_duration(secs));
                }
            });
        }

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.label("Filename:");
            ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut self.title)
                    .hint_text("Enter filename (without extension)")
                    .desired_width(300.0),
            );
        });

        ui.add_space(5.0);

        ui.add_enabled_ui(!busy, |ui| {
            ui.horizontal(|ui| {
                ui.label("Format:");
                ui.selectable_value(&mut self.format, Format::Mp4, "MP4 (Video)");
                ui.selectable_value(&mut self.format, Format::Mp3, "MP3 (Audio)");
            });

            ui.horizontal(|ui| {
                ui.label("Quality:");
                match self.format {
                    Format::Mp4 => {
                        egui::ComboBox::from_id_salt("video_quality")
                            .selected_text(self.video_quality.label())
                            .show_ui(ui, |ui| {
                                for q in VideoQuality::ALL {
                                    ui.selectable_value(&mut self.video_quality, q, q.label());
                                }
                            });
                    }
                    Format::Mp3 => {
                        egui::ComboBox::from_id_salt("audio_quality")
                            .selected_text(self.audio_quality.label())
                            .show_ui(ui, |ui| {
                                for q in AudioQuality::ALL {
                                    ui.selectable_value(&mut self.audio_quality, q, q.label());
                                }
                            });
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Save to:");
                folder_picker_button(ui, "Choose folder", &mut self.config.output_dir);
                ui.label(format!("📁 {}", self.config.output_dir.display()));
            });

            ui.checkbox(&mut self.config.force, "Overwrite existing file");
        });

        ui.add_space(15.0);

        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Back")).clicked() {
                self.go_back();
            }
            let label = if busy { "Downloading..." } else { "Download" };
            if ui
                .add_enabled(!busy, egui::Button::new(label).min_size(egui::vec2(120.0, 30.0)))
                .clicked()
            {
                self.start_download_operation();
            }
        });
    }

    fn draw_progress_ui(&mut self, ui: &mut egui::Ui) {
        if self.progress.is_running() {
            ui.separator();
            ui.add_space(10.0);

            if let Some(fraction) = self.progress.fraction() {
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .text(format!("{}%", (fraction * 100.0).round() as u32)),
                );
                ui.label(&self.progress.message);
            } else {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(&self.progress.message);
                });
            }

            ui.add_space(5.0);
        }
    }

    fn draw_message_ui(&mut self, ui: &mut egui::Ui) {
        let Some(ref message) = self.message else {
            return;
        };
        let color = match message.severity {
            Severity::Success => egui::Color32::GREEN,
            Severity::Warning => egui::Color32::from_rgb(255, 165, 0),
            Severity::Error => egui::Color32::RED,
        };

        ui.separator();
        ui.add_space(10.0);
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.colored_label(color, &message.text);
        });
        if ui.button("🗑 Clear").clicked() {
            self.message = None;
        }
    }

    fn handle_operation_messages(&mut self) {
        let mut messages_to_process = Vec::new();

        if let Some(ref mut receiver) = self.result_receiver {
            while let Ok(message) = receiver.try_recv() {
                messages_to_process.push(message);
            }
        }

        for message in messages_to_process {
            match message {
                OperationMessage::Flow(FlowEvent::Status(status)) => {
                    self.progress.message = status;
                }
                OperationMessage::Flow(FlowEvent::Progress(snapshot)) => {
                    self.progress.update(snapshot);
                }
                OperationMessage::Flow(FlowEvent::Message(message)) => {
                    self.message = Some(message);
                }
                OperationMessage::LookedUp(found) => {
                    self.progress.reset();
                    self.title = found.info.title.clone();
                    self.lookup = Some(found);
                    self.step = AppStep::Download;
                    self.result_receiver = None;
                }
                OperationMessage::Finished { success } => {
                    self.progress.reset();
                    self.result_receiver = None;
                    self.operation_handle = None;
                    if success && self.step == AppStep::Download {
                        self.reset_form();
                    }
                }
            }
        }
    }

    fn go_back(&mut self) {
        self.step = AppStep::Url;
        self.lookup = None;
        self.message = None;
    }

    fn reset_form(&mut self) {
        self.video_url.clear();
        self.title.clear();
        self.format = Format::Mp4;
        self.lookup = None;
        self.step = AppStep::Url;
    }

    fn start_lookup_operation(&mut self) {
        let Some(rt) = self.runtime.clone() else {
            return;
        };
        let url = self.video_url.clone();
        let config = self.config.clone();

        let (sender, receiver) = mpsc::unbounded_channel();
        self.result_receiver = Some(receiver);
        self.message = None;
        self.progress.start("Fetching video info...");

        self.operation_handle = Some(rt.spawn(async move {
            Operation::lookup(config, url, sender).await;
        }));
    }

    fn start_download_operation(&mut self) {
        let Some(rt) = self.runtime.clone() else {
            return;
        };
        let form = DownloadForm {
            url: self.video_url.clone(),
            title: self.title.clone(),
            format: self.format,
            video_quality: self.video_quality,
            audio_quality: self.audio_quality,
        };
        let config = self.config.clone();

        let (sender, receiver) = mpsc::unbounded_channel();
        self.result_receiver = Some(receiver);
        self.message = None;
        self.progress.start("Processing");

        self.operation_handle = Some(rt.spawn(async move {
            Operation::download(config, form, sender).await;
        }));
    }
}
