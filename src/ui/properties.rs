// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Box properties panel.
//!
//! Shows the image details, the last selected box, the class chooser and
//! the list of boxes. Edits are returned as a [`PropertiesAction`] so the
//! app can route them through the edit session.

use crate::models::annotation::BoxId;
use crate::models::project::Project;
use crate::util::geometry::Rect;

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    ChangeClass(String),
    AddClass(String),
    SelectBox { id: BoxId, additive: bool },
    DeleteSelected,
}

/// The most recently selected box, as reported by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    pub rect: Rect,
    pub class_name: Option<String>,
}

pub fn show(
    ui: &mut egui::Ui,
    project: Option<&Project>,
    selection: Option<&SelectionInfo>,
    new_class: &mut String,
) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Properties");
    ui.separator();

    let Some(project) = project else {
        ui.label(egui::RichText::new("No image loaded").weak());
        return action;
    };
    let session = project.session();
    let frame = session.frame();

    let file_name = project
        .image_path()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    ui.label(format!("Image: {}", file_name));
    ui.label(format!("Size: {} x {}", frame.width, frame.height));
    ui.label(format!("Labels: {}", project.label_path().display()));

    ui.separator();
    ui.label(egui::RichText::new("Selection").strong());
    match selection {
        Some(info) => {
            ui.label(format!("Class: {}", info.class_name.as_deref().unwrap_or("(unknown)")));
            ui.label(format!("Position: {:.0}, {:.0}", info.rect.x, info.rect.y));
            ui.label(format!("Size: {:.0} x {:.0}", info.rect.width, info.rect.height));
        }
        None => {
            ui.label(egui::RichText::new("Nothing selected").weak());
        }
    }

    ui.separator();
    ui.label(egui::RichText::new("Class").strong());
    let classes = session.classes().names();
    let current = classes.get(session.current_class()).cloned().unwrap_or_default();
    egui::ComboBox::from_id_source("class_chooser")
        .selected_text(current.as_str())
        .show_ui(ui, |ui| {
            for name in &classes {
                if ui.selectable_label(*name == current, name.as_str()).clicked() {
                    action = PropertiesAction::ChangeClass(name.clone());
                }
            }
        });
    ui.horizontal(|ui| {
        ui.text_edit_singleline(new_class);
        let name = new_class.trim();
        if ui.add_enabled(!name.is_empty(), egui::Button::new("Add")).clicked() {
            action = PropertiesAction::AddClass(name.to_string());
            new_class.clear();
        }
    });

    ui.separator();
    ui.label(egui::RichText::new(format!("Boxes ({})", session.boxes().len())).strong());
    let additive = ui.input(|i| i.modifiers.command);
    egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
        for (i, b) in session.boxes().iter().enumerate() {
            let r = b.rect();
            let name = b.class_name().unwrap_or_else(|| format!("#{}", b.class_id()));
            let text = format!("{}: {} ({:.0}, {:.0}) {:.0}x{:.0}", i + 1, name, r.x, r.y, r.width, r.height);
            if ui.selectable_label(b.is_selected(), text).clicked() {
                action = PropertiesAction::SelectBox { id: b.id(), additive };
            }
        }
    });

    let has_selection = session.boxes().selected_count() > 0;
    if ui.add_enabled(has_selection, egui::Button::new("Delete Selected")).clicked() {
        action = PropertiesAction::DeleteSelected;
    }

    action
}
