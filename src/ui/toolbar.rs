// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.

use crate::session::Tool;

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, current_tool: &mut Tool) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        if ui.selectable_label(*current_tool == Tool::Select, "⬆ Select").clicked() {
            *current_tool = Tool::Select;
        }

        if ui.selectable_label(*current_tool == Tool::Draw, "▭ Draw").clicked() {
            *current_tool = Tool::Draw;
        }

        if ui.selectable_label(*current_tool == Tool::Pan, "✋ Pan").clicked() {
            *current_tool = Tool::Pan;
        }

        ui.separator();

        let tool_text = match current_tool {
            Tool::Select => "Click to select boxes, drag to move or resize, drag on empty space to marquee select",
            Tool::Draw => "Drag on empty space to draw a box, click a box to select it",
            Tool::Pan => "Drag to scroll the image",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}
