// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file loading.
//!
//! This module decodes image files into RGBA pixels suitable for display
//! in egui. The editing core only needs the pixel dimensions, so loading
//! goes through the [`ImageLoader`] trait and can be replaced in tests.

use crate::error::EditorError;
use std::path::Path;

/// A decoded image.
#[derive(Debug)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row-major.
    pub pixels: Vec<u8>,
}

pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, EditorError>;
}

/// Loads images from disk with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileLoader;

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<LoadedImage, EditorError> {
        load_image(path)
    }
}

/// Decode an image file into RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage, EditorError> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| EditorError::Decode(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| EditorError::Decode(format!("{}: {}", path.display(), e)))?;
    if reader.format().is_none() {
        return Err(EditorError::UnsupportedFormat(path.display().to_string()));
    }
    let rgba = reader.decode()?.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Decoded {} ({}x{})", path.display(), width, height);
    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbaImage::new(4, 3).save(&path).unwrap();

        let img = ImageFileLoader.load(&path).unwrap();
        assert_eq!((img.width, img.height), (4, 3));
        assert_eq!(img.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.bin");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(
            err,
            EditorError::UnsupportedFormat(_) | EditorError::Decode(_)
        ));
    }
}
