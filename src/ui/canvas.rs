// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and box editing.
//!
//! The canvas fits the image into the available space, applies the view's
//! zoom and pan, draws the session's boxes on top and translates egui
//! pointer input into session [`PointerEvent`]s in image pixels.

use crate::models::annotation::LabelBox;
use crate::models::grabber::{handle_regions, CursorShape};
use crate::session::{EditSession, Modifiers, PointerEvent, Tool};
use crate::util::geometry::{Point, Rect};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 16.0;

/// Zoom and scroll state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// Multiplier on top of the fit-to-canvas scale
    pub zoom: f32,
    /// Image offset in screen pixels
    pub pan: egui::Vec2,
}

impl Default for View {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
        }
    }
}

impl View {
    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of one frame of canvas interaction.
pub struct CanvasOutput {
    pub events: Vec<PointerEvent>,
    /// Screen pixels per image pixel
    pub scale: f32,
}

/// Mapping between image pixels and screen positions.
#[derive(Debug, Clone, Copy)]
struct Transform {
    image_rect: egui::Rect,
    scale: f32,
}

impl Transform {
    fn to_screen(&self, p: Point) -> egui::Pos2 {
        self.image_rect.min + egui::vec2(p.x as f32, p.y as f32) * self.scale
    }

    fn rect_to_screen(&self, r: &Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.to_screen(r.top_left()),
            self.to_screen(Point::new(r.right(), r.bottom())),
        )
    }

    fn to_image(&self, pos: egui::Pos2) -> Point {
        let rel = (pos - self.image_rect.min) / self.scale;
        Point::new(f64::from(rel.x), f64::from(rel.y))
    }
}

/// Display the canvas and collect pointer input.
pub fn show(
    ui: &mut egui::Ui,
    session: Option<&EditSession>,
    image_texture: &Option<egui::TextureHandle>,
    view: &View,
    handle_size: f32,
) -> CanvasOutput {
    let mut output = CanvasOutput {
        events: Vec::new(),
        scale: 1.0,
    };
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let (Some(session), Some(texture)) = (session, image_texture) else {
        show_welcome(ui);
        return output;
    };

    let (canvas_rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
    let painter = ui.painter_at(canvas_rect);
    painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

    let frame = session.frame();
    let (img_width, img_height) = (frame.width as f32, frame.height as f32);
    // Fit the image in the canvas, then apply zoom around the canvas center
    let fit = (canvas_rect.width() / img_width).min(canvas_rect.height() / img_height);
    let scale = fit * view.zoom;
    let display = egui::vec2(img_width, img_height) * scale;
    let image_rect = egui::Rect::from_center_size(canvas_rect.center() + view.pan, display);
    let transform = Transform { image_rect, scale };
    output.scale = scale;

    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );

    for b in session.boxes().iter() {
        draw_box(&painter, &transform, b, handle_size);
    }
    if let Some(pending) = session.pending_box() {
        let r = transform.rect_to_screen(&pending.rect());
        painter.rect_stroke(r, 0.0, egui::Stroke::new(1.5, egui::Color32::LIGHT_BLUE));
    }
    if let Some(marquee) = session.marquee() {
        let r = transform.rect_to_screen(&marquee);
        painter.rect_filled(r, 0.0, egui::Color32::from_rgba_unmultiplied(100, 150, 255, 40));
        painter.rect_stroke(r, 0.0, egui::Stroke::new(1.0, egui::Color32::from_rgb(100, 150, 255)));
    }

    collect_pointer_events(ui, &response, &transform, &mut output.events);

    if let Some(pos) = response.hover_pos() {
        let shape = session.hover_cursor(transform.to_image(pos));
        ui.ctx().set_cursor_icon(cursor_icon(shape));
    }

    output
}

fn collect_pointer_events(
    ui: &egui::Ui,
    response: &egui::Response,
    transform: &Transform,
    events: &mut Vec<PointerEvent>,
) {
    let (pressed, released, moved, latest, multi_select) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta() != egui::Vec2::ZERO,
            i.pointer.latest_pos(),
            i.modifiers.command,
        )
    });
    let Some(screen_pos) = latest else {
        return;
    };
    let pos = transform.to_image(screen_pos);

    if pressed && response.hovered() {
        events.push(PointerEvent::Down {
            pos,
            modifiers: Modifiers { multi_select },
        });
    }
    if moved && (response.hovered() || response.dragged()) {
        events.push(PointerEvent::Move { pos });
    }
    if released {
        events.push(PointerEvent::Up { pos });
    }
}

fn class_color(class_id: usize) -> egui::Color32 {
    const PALETTE: [egui::Color32; 6] = [
        egui::Color32::YELLOW,
        egui::Color32::LIGHT_GREEN,
        egui::Color32::from_rgb(255, 140, 0),
        egui::Color32::from_rgb(255, 105, 180),
        egui::Color32::from_rgb(0, 200, 255),
        egui::Color32::from_rgb(180, 130, 255),
    ];
    PALETTE[class_id % PALETTE.len()]
}

/// Draw a box, its class name and, when selected, its handles.
fn draw_box(painter: &egui::Painter, transform: &Transform, b: &LabelBox, handle_size: f32) {
    let color = class_color(b.class_id());
    let rect = transform.rect_to_screen(&b.rect());
    let width = if b.is_selected() { 2.5 } else { 1.5 };
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(width, color));

    let name = b.class_name().unwrap_or_else(|| format!("#{}", b.class_id()));
    painter.text(
        rect.left_top(),
        egui::Align2::LEFT_BOTTOM,
        name,
        egui::FontId::proportional(12.0),
        color,
    );

    if !b.is_selected() {
        return;
    }
    // Handles are sized in screen pixels
    let image_size = f64::from(handle_size / transform.scale);
    for (_, region) in handle_regions(&b.rect(), image_size) {
        let r = transform.rect_to_screen(&region);
        painter.rect_filled(r, 0.0, egui::Color32::WHITE);
        painter.rect_stroke(r, 0.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
    }
}

fn cursor_icon(shape: CursorShape) -> egui::CursorIcon {
    match shape {
        CursorShape::Default => egui::CursorIcon::Default,
        CursorShape::Crosshair => egui::CursorIcon::Crosshair,
        CursorShape::Move => egui::CursorIcon::Move,
        CursorShape::Grab => egui::CursorIcon::Grab,
        CursorShape::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
        CursorShape::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
        CursorShape::ResizeVertical => egui::CursorIcon::ResizeVertical,
        CursorShape::ResizeHorizontal => egui::CursorIcon::ResizeHorizontal,
    }
}

fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Boxmark")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Bounding box annotation")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(egui::RichText::new("Open an image to begin annotating").color(egui::Color32::from_gray(180)));
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Image...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}

/// Status line under the canvas.
pub fn show_status(ui: &mut egui::Ui, tool: Tool, cursor: Option<Point>, status: Option<&str>) {
    ui.horizontal(|ui| {
        ui.label(format!("Current tool: {:?}", tool));
        ui.separator();
        match cursor {
            Some(p) => ui.label(format!("x: {:.0}  y: {:.0}", p.x, p.y)),
            None => ui.label("No file loaded"),
        };
        if let Some(status) = status {
            ui.separator();
            ui.label(status);
        }
    });
}
