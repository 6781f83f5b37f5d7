// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the open [`Project`] and forwards canvas pointer input,
//! keyboard shortcuts and panel actions to its edit session. Everything
//! the session reports back arrives as [`EditorEvent`]s, drained once per
//! frame.

use crate::config::EditorConfig;
use crate::io::media::{ImageFileLoader, ImageLoader, LoadedImage};
use crate::models::classes::ClassList;
use crate::models::project::Project;
use crate::session::clipboard::MemoryClipboard;
use crate::session::{EditorEvent, KeyCommand, Tool};
use crate::ui::{canvas, properties, toolbar};
use crate::util::geometry::Point;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

/// Result of background image loading operation.
struct LoadedImageData {
    path: PathBuf,
    image: LoadedImage,
}

/// Main application state.
pub struct BoxmarkApp {
    config: EditorConfig,

    /// Class names shared by every project
    classes: ClassList,

    /// Clipboard shared by every project, so boxes can be copied between images
    clipboard: MemoryClipboard,

    /// Currently selected editing tool
    current_tool: Tool,

    /// Open image and its boxes
    project: Option<Project>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    view: canvas::View,

    /// Screen pixels per image pixel in the last frame
    scale: f32,

    /// Pointer position in image pixels
    cursor: Option<Point>,

    /// Last selected box, for the properties panel
    selection: Option<properties::SelectionInfo>,

    /// Text field for adding a class
    new_class: String,

    /// Message for the status bar
    status: Option<String>,

    show_about: bool,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,

    /// Loading state message
    loading_message: Option<String>,
}

impl BoxmarkApp {
    /// Create the application, opening `image` right away if given.
    pub fn new(cc: &eframe::CreationContext<'_>, config: EditorConfig, image: Option<PathBuf>) -> Self {
        let mut app = Self {
            classes: ClassList::new(config.classes.clone()),
            config,
            clipboard: MemoryClipboard::default(),
            current_tool: Tool::Draw,
            project: None,
            image_texture: None,
            view: canvas::View::default(),
            scale: 1.0,
            cursor: None,
            selection: None,
            new_class: String::new(),
            status: None,
            show_about: false,
            image_loader: None,
            loading_message: None,
        };
        if let Some(path) = image {
            app.open_now(&cc.egui_ctx, &path);
        }
        app
    }

    /// Decode and open an image on the UI thread.
    fn open_now(&mut self, ctx: &egui::Context, path: &Path) {
        let opened = Project::open(
            path,
            &ImageFileLoader,
            self.classes.clone(),
            self.config.session_settings(),
            self.clipboard.clone(),
        );
        match opened {
            Ok((project, image)) => self.install(ctx, project, &image),
            Err(e) => {
                log::error!("Failed to open {}: {}", path.display(), e);
                self.status = Some(format!("Failed to open {}: {}", path.display(), e));
            }
        }
    }

    /// Load an image file in the background.
    pub fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        // Spawn background thread for decoding
        std::thread::spawn(move || {
            let result = ImageFileLoader
                .load(&path)
                .map(|image| LoadedImageData { path, image })
                .map_err(|e| format!("Failed to load image: {}", e));
            let _ = sender.send(result);
        });
    }

    /// Make `project` current, closing the previous one.
    fn install(&mut self, ctx: &egui::Context, mut project: Project, image: &LoadedImage) {
        self.close_project();

        let size = [image.width as usize, image.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
        self.image_texture = Some(ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR));

        project.session_mut().set_tool(self.current_tool);
        self.project = Some(project);
        self.view.reset();
        self.selection = None;
        self.drain_session_events();
    }

    /// Save and close the current project, if any.
    fn close_project(&mut self) {
        if let Some(project) = self.project.take() {
            if let Err(e) = project.close() {
                log::warn!("Failed to save labels: {}", e);
                self.status = Some(format!("Failed to save labels: {}", e));
            }
        }
        self.image_texture = None;
        self.cursor = None;
        self.selection = None;
    }

    fn save_project(&mut self) {
        let Some(project) = &self.project else {
            return;
        };
        self.status = Some(match project.save() {
            Ok(()) => format!("Saved {}", project.label_path().display()),
            Err(e) => {
                log::warn!("Failed to save labels: {}", e);
                format!("Failed to save labels: {}", e)
            }
        });
    }

    fn send_key(&mut self, ctx: &egui::Context, key: KeyCommand) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let session = project.session_mut();
        session.handle_key(key);
        // Mirror copies to the system clipboard so Ctrl+V delivers them back
        if matches!(key, KeyCommand::Copy | KeyCommand::Cut) {
            if let Some(text) = session.clipboard_text() {
                ctx.output_mut(|o| o.copied_text = text);
            }
        }
    }

    fn set_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
        if let Some(project) = self.project.as_mut() {
            project.session_mut().set_tool(tool);
        }
    }

    fn drain_session_events(&mut self) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        for event in project.session_mut().drain_events() {
            match event {
                EditorEvent::ImageLoaded { width, height } => {
                    self.status = Some(format!("Loaded {}x{} image", width, height));
                }
                EditorEvent::CursorMoved(pos) => self.cursor = Some(pos),
                EditorEvent::BoxSelected { rect, class_name, .. } => {
                    self.selection = Some(properties::SelectionInfo { rect, class_name });
                }
                EditorEvent::SelectionCleared => self.selection = None,
                EditorEvent::Panned(delta) => {
                    self.view.pan += egui::vec2(delta.dx as f32, delta.dy as f32) * self.scale;
                }
            }
        }
    }

    /// Translate keyboard shortcuts into session commands.
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Don't steal keys from text fields
        if ctx.wants_keyboard_input() {
            return;
        }
        let mut pasted = Vec::new();
        let keys: Vec<KeyCommand> = ctx.input(|i| {
            let mut keys = Vec::new();
            for event in &i.events {
                match event {
                    egui::Event::Copy => keys.push(KeyCommand::Copy),
                    egui::Event::Cut => keys.push(KeyCommand::Cut),
                    egui::Event::Paste(text) => pasted.push(text.clone()),
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => {
                        let command = match *key {
                            egui::Key::Delete | egui::Key::Backspace => Some(KeyCommand::Delete),
                            egui::Key::Escape => Some(KeyCommand::Cancel),
                            egui::Key::A if modifiers.command => Some(KeyCommand::SelectAll),
                            egui::Key::Z if modifiers.command && modifiers.shift => Some(KeyCommand::Redo),
                            egui::Key::Z if modifiers.command => Some(KeyCommand::Undo),
                            egui::Key::Y if modifiers.command => Some(KeyCommand::Redo),
                            _ => None,
                        };
                        keys.extend(command);
                    }
                    _ => {}
                }
            }
            keys
        });
        for key in keys {
            self.send_key(ctx, key);
        }
        if let Some(project) = self.project.as_mut() {
            for text in pasted {
                project.session_mut().paste_text(&text);
            }
        }
    }

    fn handle_properties_action(&mut self, action: properties::PropertiesAction) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let session = project.session_mut();
        match action {
            properties::PropertiesAction::ChangeClass(name) => {
                if let Err(e) = session.change_class(&name) {
                    log::warn!("{}", e);
                    self.status = Some(e.to_string());
                }
            }
            properties::PropertiesAction::AddClass(name) => {
                let index = self.classes.push(name.as_str());
                log::info!("Class {} is index {}", name, index);
            }
            properties::PropertiesAction::SelectBox { id, additive } => session.select_box(id, additive),
            properties::PropertiesAction::DeleteSelected => {
                session.delete_selected();
            }
            properties::PropertiesAction::None => {}
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    // Open native file picker
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
                        .pick_file()
                    {
                        self.load_image_file(path);
                    }
                    ui.close_menu();
                }
                let has_project = self.project.is_some();
                if ui.add_enabled(has_project, egui::Button::new("Save Labels")).clicked() {
                    self.save_project();
                    ui.close_menu();
                }
                if ui.add_enabled(has_project, egui::Button::new("Close Image")).clicked() {
                    self.close_project();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                let session = self.project.as_ref().map(Project::session);
                let can_undo = session.is_some_and(|s| s.can_undo());
                let can_redo = session.is_some_and(|s| s.can_redo());
                let has_selection = session.is_some_and(|s| s.boxes().selected_count() > 0);

                let items = [
                    (can_undo, "Undo (Ctrl+Z)", KeyCommand::Undo),
                    (can_redo, "Redo (Ctrl+Shift+Z)", KeyCommand::Redo),
                    (has_selection, "Cut (Ctrl+X)", KeyCommand::Cut),
                    (has_selection, "Copy (Ctrl+C)", KeyCommand::Copy),
                    (session.is_some(), "Paste (Ctrl+V)", KeyCommand::Paste),
                    (has_selection, "Delete Selected", KeyCommand::Delete),
                    (session.is_some(), "Select All (Ctrl+A)", KeyCommand::SelectAll),
                ];
                let mut clicked = None;
                for (i, (enabled, text, key)) in items.into_iter().enumerate() {
                    if i == 2 || i == 5 {
                        ui.separator();
                    }
                    if ui.add_enabled(enabled, egui::Button::new(text)).clicked() {
                        clicked = Some(key);
                    }
                }
                if let Some(key) = clicked {
                    self.send_key(ctx, key);
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.view.zoom_by(1.25);
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.view.zoom_by(0.8);
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.view.reset();
                    ui.close_menu();
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });
        });
    }
}

impl eframe::App for BoxmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed image loading
        if let Some(ref receiver) = self.image_loader {
            if let Ok(result) = receiver.try_recv() {
                self.image_loader = None;
                self.loading_message = None;

                match result {
                    Ok(loaded) => {
                        let project = Project::with_frame(
                            &loaded.path,
                            loaded.image.width,
                            loaded.image.height,
                            self.classes.clone(),
                            self.config.session_settings(),
                            self.clipboard.clone(),
                        );
                        self.install(ctx, project, &loaded.image);
                        log::info!("Image loaded successfully");
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        self.status = Some(e);
                    }
                }
            }
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        // Toolbar
        let mut tool = self.current_tool;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut tool);
        });
        if tool != self.current_tool {
            self.set_tool(tool);
        }

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                properties::show(ui, self.project.as_ref(), self.selection.as_ref(), &mut self.new_class)
            })
            .inner;
        self.handle_properties_action(properties_action);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            canvas::show_status(ui, self.current_tool, self.cursor, self.status.as_deref());
        });

        self.handle_keyboard(ctx);

        // Main canvas (center)
        let canvas_output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                // Show loading overlay if loading
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    None
                } else {
                    Some(canvas::show(
                        ui,
                        self.project.as_ref().map(Project::session),
                        &self.image_texture,
                        &self.view,
                        self.config.handle_size as f32,
                    ))
                }
            })
            .inner;

        if let (Some(output), Some(project)) = (canvas_output, self.project.as_mut()) {
            self.scale = output.scale;
            let session = project.session_mut();
            session.set_handle_size(self.config.handle_size / f64::from(output.scale));
            for event in output.events {
                if let Err(e) = session.handle_pointer(event) {
                    log::debug!("Pointer event dropped: {}", e);
                }
            }
        }

        self.drain_session_events();

        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!("Boxmark {}", env!("CARGO_PKG_VERSION")));
                    ui.label("Bounding box annotation with normalized label files.");
                });
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.close_project();
    }
}
