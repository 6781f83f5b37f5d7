// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is one opened image together with its label file and the
//! edit session working on its boxes. Opening reads any existing labels;
//! closing writes them back.

use super::classes::ClassList;
use crate::error::EditorError;
use crate::io::labels::{label_path_for_image, read_label_file, write_label_file};
use crate::io::media::{ImageLoader, LoadedImage};
use crate::session::clipboard::Clipboard;
use crate::session::{EditSession, EditorEvent, SessionSettings};
use crate::util::geometry::Size;
use std::path::{Path, PathBuf};

pub struct Project {
    image_path: PathBuf,
    label_path: PathBuf,
    session: EditSession,
}

impl Project {
    /// Decode `image_path` with `loader` and open a project for it.
    pub fn open(
        image_path: &Path,
        loader: &dyn ImageLoader,
        classes: ClassList,
        settings: SessionSettings,
        clipboard: impl Clipboard + 'static,
    ) -> Result<(Project, LoadedImage), EditorError> {
        let image = loader.load(image_path)?;
        let project = Self::with_frame(image_path, image.width, image.height, classes, settings, clipboard);
        Ok((project, image))
    }

    /// Open a project for an image whose dimensions are already known.
    ///
    /// A missing or unreadable label file starts the project with no boxes.
    pub fn with_frame(
        image_path: &Path,
        width: u32,
        height: u32,
        classes: ClassList,
        settings: SessionSettings,
        clipboard: impl Clipboard + 'static,
    ) -> Project {
        let label_path = label_path_for_image(image_path);
        let frame = Size::new(f64::from(width), f64::from(height));
        let mut session = EditSession::new(frame, classes, settings).with_clipboard(clipboard);

        if label_path.exists() {
            match read_label_file(&label_path) {
                Ok(records) => session.load_records(&records),
                Err(e) => log::warn!("Ignoring labels: {}", e),
            }
        }
        session.emit(EditorEvent::ImageLoaded { width, height });
        log::info!("Opened {} ({}x{})", image_path.display(), width, height);

        Project {
            image_path: image_path.to_path_buf(),
            label_path,
            session,
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn label_path(&self) -> &Path {
        &self.label_path
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Write the label file.
    pub fn save(&self) -> Result<(), EditorError> {
        let records = self.session.records();
        write_label_file(&self.label_path, &records)?;
        log::info!("Saved {} labels to {}", records.len(), self.label_path.display());
        Ok(())
    }

    /// Save and drop the undo history.
    pub fn close(mut self) -> Result<(), EditorError> {
        let saved = self.save();
        self.session.clear_history();
        log::debug!("Closed {}", self.image_path.display());
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clipboard::MemoryClipboard;
    use crate::session::{Modifiers, PointerEvent, Tool};
    use crate::util::geometry::{Point, Rect};

    struct FixedLoader(u32, u32);

    impl ImageLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<LoadedImage, EditorError> {
            Ok(LoadedImage {
                width: self.0,
                height: self.1,
                pixels: vec![0; (self.0 * self.1 * 4) as usize],
            })
        }
    }

    fn classes() -> ClassList {
        ClassList::new(vec!["car".into(), "person".into()])
    }

    fn open(path: &Path) -> Project {
        let (project, _) = Project::open(
            path,
            &FixedLoader(1000, 500),
            classes(),
            SessionSettings::default(),
            MemoryClipboard::default(),
        )
        .unwrap();
        project
    }

    #[test]
    fn test_open_reads_existing_labels() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("street.jpg");
        std::fs::write(dir.path().join("street.txt"), "0 0.5 0.5 0.2 0.4\n7 0.1 0.1 0.1 0.1\n").unwrap();

        let mut project = open(&image);
        assert_eq!(project.label_path(), dir.path().join("street.txt"));
        let boxes = project.session().boxes();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.iter().next().unwrap().rect(), Rect::new(400.0, 150.0, 200.0, 200.0));
        assert_eq!(boxes.iter().nth(1).unwrap().class_name(), None);

        let events = project.session_mut().drain_events();
        assert_eq!(events, vec![EditorEvent::ImageLoaded { width: 1000, height: 500 }]);
    }

    #[test]
    fn test_open_without_labels_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let project = open(&dir.path().join("empty.png"));
        assert!(project.session().boxes().is_empty());
    }

    #[test]
    fn test_close_writes_labels() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("frame.png");
        let mut project = open(&image);

        let session = project.session_mut();
        session.set_tool(Tool::Draw);
        session
            .handle_pointer(PointerEvent::Down {
                pos: Point::new(400.0, 150.0),
                modifiers: Modifiers::default(),
            })
            .unwrap();
        session.handle_pointer(PointerEvent::Move { pos: Point::new(600.0, 350.0) }).unwrap();
        session.handle_pointer(PointerEvent::Up { pos: Point::new(600.0, 350.0) }).unwrap();
        project.close().unwrap();

        let text = std::fs::read_to_string(dir.path().join("frame.txt")).unwrap();
        assert_eq!(text, "0 0.500000 0.500000 0.200000 0.400000\n");

        let reopened = open(&image);
        assert_eq!(reopened.session().boxes().len(), 1);
        assert!(!reopened.session().can_undo());
    }

    #[test]
    fn test_unreadable_label_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the label file should be cannot be read.
        std::fs::create_dir(dir.path().join("odd.txt")).unwrap();
        let project = open(&dir.path().join("odd.png"));
        assert!(project.session().boxes().is_empty());
        assert!(project.save().is_err());
    }

    #[test]
    fn test_loader_errors_propagate() {
        struct Failing;
        impl ImageLoader for Failing {
            fn load(&self, path: &Path) -> Result<LoadedImage, EditorError> {
                Err(EditorError::UnsupportedFormat(path.display().to_string()))
            }
        }
        let result = Project::open(
            Path::new("x.gif"),
            &Failing,
            classes(),
            SessionSettings::default(),
            MemoryClipboard::default(),
        );
        assert!(matches!(result, Err(EditorError::UnsupportedFormat(_))));
    }
}
