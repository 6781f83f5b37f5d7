// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the editing core.
//!
//! Everything that crosses the edit session boundary reports failure
//! through [`EditorError`]. The application shell wraps these in
//! `anyhow` where it only needs to report them.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum EditorError {
    /// The image file is not in a format the loader understands.
    UnsupportedFormat(String),
    /// The image file could not be decoded.
    Decode(String),
    /// A label file could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A class name is not present in the class list.
    ClassNotFound(String),
    /// A box with zero or negative area.
    DegenerateGeometry,
    /// A pointer coordinate was NaN or infinite.
    NonFiniteInput,
}

impl EditorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::UnsupportedFormat(msg) => write!(f, "unsupported image format: {msg}"),
            EditorError::Decode(msg) => write!(f, "failed to decode image: {msg}"),
            EditorError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            EditorError::ClassNotFound(name) => write!(f, "unknown class name \"{name}\""),
            EditorError::DegenerateGeometry => write!(f, "box has no area"),
            EditorError::NonFiniteInput => write!(f, "coordinates must be finite numbers"),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => EditorError::UnsupportedFormat(e.to_string()),
            other => EditorError::Decode(other.to_string()),
        }
    }
}
