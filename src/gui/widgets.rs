use std::path::PathBuf;
use std::time::Instant;

use eframe::egui;

use ambatudonlod::{AnimateOn, Error, RevealOptions, RevealScheduler, TriggerSet};

pub fn folder_picker_button(
    ui: &mut egui::Ui,
    text: &str,
    current_path: &mut PathBuf,
) -> bool {
    let mut changed = false;

    if ui.button(text).clicked()
        && let Some(path) = rfd::FileDialog::new().pick_folder()
    {
        *current_path = path;
        changed = true;
    }

    changed
}

/// Heading text that scrambles and reveals itself when seen or hovered.
pub struct DecryptedText {
    scheduler: RevealScheduler,
    triggers: TriggerSet,
    next_tick: Option<Instant>,
    was_hovered: bool,
}

impl DecryptedText {
    pub fn new(text: &str, animate_on: AnimateOn, options: RevealOptions) -> Result<Self, Error> {
        Ok(Self {
            scheduler: RevealScheduler::new(text, options)?,
            triggers: TriggerSet::from(animate_on),
            next_tick: None,
            was_hovered: false,
        })
    }

    pub fn show(&mut self, ui: &mut egui::Ui, font: egui::FontId) -> egui::Response {
        let job = self.layout(ui, font);
        let mut response = ui.add(egui::Label::new(job).sense(egui::Sense::hover()));

        let area = response.rect.area();
        if area > 0.0 {
            let visible = ui.clip_rect().intersect(response.rect);
            let ratio = if visible.is_positive() { visible.area() / area } else { 0.0 };
            if self.triggers.on_visibility(ratio) {
                self.start();
            }
        }

        let hovered = response.hovered();
        if hovered && !self.was_hovered && self.triggers.on_pointer_enter() {
            self.start();
        }
        self.was_hovered = hovered;

        if self.triggers.wants_hover() {
            response = response.on_hover_cursor(egui::CursorIcon::PointingHand);
        }

        self.drive(ui.ctx());
        response
    }

    fn start(&mut self) {
        if self.scheduler.start() {
            self.next_tick = Some(Instant::now());
        }
    }

    /// Tick on the frame clock and ask for the next repaint while running.
    fn drive(&mut self, ctx: &egui::Context) {
        if !self.scheduler.is_running() {
            self.next_tick = None;
            return;
        }
        let speed = self.scheduler.options().speed;
        let now = Instant::now();
        if self.next_tick.is_none_or(|at| now >= at) {
            self.scheduler.tick();
            self.next_tick = Some(now + speed);
        }
        ctx.request_repaint_after(speed);
    }

    fn layout(&self, ui: &egui::Ui, font: egui::FontId) -> egui::text::LayoutJob {
        let visuals = ui.visuals();
        let revealed = visuals.strong_text_color();
        let scrambled = visuals.weak_text_color();
        let state = self.scheduler.state();
        let running = self.scheduler.is_running();

        let mut job = egui::text::LayoutJob::default();
        let mut buf = [0u8; 4];
        for (i, c) in self.scheduler.frame().chars().enumerate() {
            let color = if !running || state.is_revealed(i) {
                revealed
            } else {
                scrambled
            };
            job.append(
                c.encode_utf8(&mut buf),
                0.0,
                egui::TextFormat::simple(font.clone(), color),
            );
        }
        job
    }
}

impl Drop for DecryptedText {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
