// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Boxmark - bounding box annotation editor
//!
//! A cross-platform desktop application for drawing labelled bounding
//! boxes on images. Boxes are stored next to each image in a plain text
//! label file with one normalized box per line.
//!
//! Usage: `boxmark [IMAGE] [CONFIG]`

mod app;
mod config;
mod error;
mod io;
mod models;
mod session;
mod ui;
mod util;

use anyhow::Result;
use app::BoxmarkApp;
use config::{EditorConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let image = args.next().map(PathBuf::from);
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = EditorConfig::load_or_default(&config_path);
    log::debug!("Using config {:?}", config);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Boxmark - Bounding Box Annotation"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Boxmark",
        options,
        Box::new(move |cc| Ok(Box::new(BoxmarkApp::new(cc, config, image)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
