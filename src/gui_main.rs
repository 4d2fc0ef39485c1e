#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;

mod gui;
use gui::AmbatudonlodApp;

fn main() -> eframe::Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 560.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ambatudonlod",
        options,
        Box::new(|cc| {
            // Thumbnails are fetched over http and decoded by these loaders.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(AmbatudonlodApp::new(cc)))
        }),
    )
}
