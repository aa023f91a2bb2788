//! Markview - versioned dataset and PDF viewer
//!
//! Loads mock datasets per version, resolves their PDF files and keeps the mark
//! list and the viewer in sync on the selected mark.

mod app;
mod core;
mod store;
mod ui;

use app::MarkviewApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Markview...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Markview"),
        ..Default::default()
    };

    eframe::run_native(
        "Markview",
        native_options,
        Box::new(|cc| Ok(Box::new(MarkviewApp::new(cc)?))),
    )
}
