// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration loaded from YAML.

use crate::models::grabber::DEFAULT_HANDLE_SIZE;
use crate::session::clipboard::DEFAULT_PASTE_OFFSET;
use crate::session::history::DEFAULT_HISTORY_LIMIT;
use crate::session::{SelectionMode, SessionSettings, DEFAULT_MIN_BOX_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "boxmark.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Initial class names
    pub classes: Vec<String>,
    /// Grabber edge length in screen pixels
    pub handle_size: f64,
    pub min_box_size: f64,
    pub paste_offset: f64,
    pub selection_mode: SelectionMode,
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            classes: default_classes(),
            handle_size: DEFAULT_HANDLE_SIZE,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            paste_offset: DEFAULT_PASTE_OFFSET,
            selection_mode: SelectionMode::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn default_classes() -> Vec<String> {
    vec!["object".to_string()]
}

impl EditorConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut config: EditorConfig = serde_yaml::from_str(text).context("Invalid editor configuration")?;
        if config.classes.is_empty() {
            config.classes = default_classes();
        }
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `path` if it exists; fall back to defaults otherwise.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{:#}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Session tunables. The handle size stays in screen pixels; hosts
    /// rescale it for the current zoom.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            handle_size: self.handle_size,
            min_box_size: self.min_box_size,
            paste_offset: self.paste_offset,
            selection_mode: self.selection_mode,
            history_limit: self.history_limit,
        }
    }
}
