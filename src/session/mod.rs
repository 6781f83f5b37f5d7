// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The box editing state machine.
//!
//! An [`EditSession`] owns the working set of boxes for one image and
//! turns pointer and keyboard input into box creation, moving, resizing,
//! selection and clipboard operations. Every committed change goes
//! through a [`HistorySink`] as a [`Command`], so it can be undone.
//!
//! The session knows nothing about rendering. A host feeds it
//! [`PointerEvent`]s in image pixel coordinates, reads back the geometry
//! to draw, and drains [`EditorEvent`]s for its side panels.

pub mod clipboard;
pub mod command;
pub mod history;

use crate::error::EditorError;
use crate::models::annotation::{BoxId, BoxSet, LabelBox, LabelRecord};
use crate::models::classes::ClassList;
use crate::models::grabber::{self, CursorShape, HandleId, Hit, DEFAULT_HANDLE_SIZE};
use crate::util::geometry::{Point, Rect, Size, Vector};
use clipboard::{Bundle, Clipboard, MemoryClipboard, PasteTracker, DEFAULT_PASTE_OFFSET};
use command::{ClassChange, Command, RectChange};
use history::{History, HistorySink, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};

/// Drawn boxes must be larger than this (in pixels) along both axes.
pub const DEFAULT_MIN_BOX_SIZE: f64 = 5.0;

/// Current editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Draw,
    Pan,
}

/// Whether more than one box may be selected at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single,
    #[default]
    Multi,
}

/// Keyboard modifiers relevant to editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Toggle membership in the selection instead of replacing it.
    pub multi_select: bool,
}

/// Pointer input in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pos: Point, modifiers: Modifiers },
    Move { pos: Point },
    Up { pos: Point },
}

impl PointerEvent {
    pub fn pos(&self) -> Point {
        match self {
            PointerEvent::Down { pos, .. } | PointerEvent::Move { pos } | PointerEvent::Up { pos } => *pos,
        }
    }
}

/// Keyboard commands understood by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Delete,
    SelectAll,
    Copy,
    Cut,
    Paste,
    Undo,
    Redo,
    /// Abort the operation in progress.
    Cancel,
}

/// Notifications for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ImageLoaded { width: u32, height: u32 },
    CursorMoved(Point),
    BoxSelected {
        id: BoxId,
        rect: Rect,
        class_name: Option<String>,
    },
    SelectionCleared,
    /// The view should scroll by this many image pixels.
    Panned(Vector),
}

/// What the session is doing between a press and a release.
#[derive(Debug, Clone)]
pub enum EditState {
    Idle,
    Drawing { anchor: Point, pending: LabelBox },
    Moving { last: Point, origins: Vec<(BoxId, Rect)> },
    Resizing { id: BoxId, handle: HandleId, original: Rect },
    MarqueeSelecting { origin: Point, current: Point, additive: bool },
    Panning { anchor: Point },
}

/// Tunables for an edit session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Handle edge length in image pixels.
    pub handle_size: f64,
    pub min_box_size: f64,
    pub paste_offset: f64,
    pub selection_mode: SelectionMode,
    pub history_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            handle_size: DEFAULT_HANDLE_SIZE,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            paste_offset: DEFAULT_PASTE_OFFSET,
            selection_mode: SelectionMode::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

pub struct EditSession<H = History> {
    frame: Size,
    classes: ClassList,
    boxes: BoxSet,
    history: H,
    clipboard: Box<dyn Clipboard>,
    paste: PasteTracker,
    settings: SessionSettings,
    tool: Tool,
    /// Class index given to newly drawn boxes
    current_class: usize,
    state: EditState,
    press_pos: Option<Point>,
    pointer_moved: bool,
    next_id: u64,
    events: Vec<EditorEvent>,
}

impl EditSession<History> {
    pub fn new(frame: Size, classes: ClassList, settings: SessionSettings) -> Self {
        Self::with_history(frame, classes, settings, History::new(settings.history_limit))
    }
}

impl<H: HistorySink> EditSession<H> {
    pub fn with_history(frame: Size, classes: ClassList, settings: SessionSettings, history: H) -> Self {
        Self {
            frame,
            classes,
            boxes: BoxSet::new(),
            history,
            clipboard: Box::new(MemoryClipboard::default()),
            paste: PasteTracker::default(),
            settings,
            tool: Tool::default(),
            current_class: 0,
            state: EditState::Idle,
            press_pos: None,
            pointer_moved: false,
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Use `clipboard` for copy, cut and paste.
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// Populate the working set from label records without touching the
    /// history. Degenerate records are dropped.
    pub fn load_records(&mut self, records: &[LabelRecord]) {
        for record in records {
            let id = self.alloc_id();
            let b = LabelBox::from_record(id, record, self.frame, self.classes.clone());
            if b.rect().is_degenerate() {
                log::debug!("Dropping degenerate label record {:?}", record);
                continue;
            }
            self.boxes.push(b);
        }
        log::info!("Loaded {} boxes", self.boxes.len());
    }

    pub fn frame(&self) -> Size {
        self.frame
    }

    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    pub fn boxes(&self) -> &BoxSet {
        &self.boxes
    }

    #[cfg(test)]
    pub fn state(&self) -> &EditState {
        &self.state
    }

    #[cfg(test)]
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Switch tools. Any operation in progress is cancelled; the pan tool
    /// also clears the selection.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        self.cancel();
        if tool == Tool::Pan {
            self.clear_selection();
        }
        log::debug!("Tool changed to {:?}", tool);
        self.tool = tool;
    }

    /// Handle size in image pixels; hosts rescale it when zooming so
    /// handles keep a constant size on screen.
    pub fn set_handle_size(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.settings.handle_size = size;
        }
    }

    pub fn current_class(&self) -> usize {
        self.current_class
    }

    /// The box being drawn, if any.
    pub fn pending_box(&self) -> Option<&LabelBox> {
        match &self.state {
            EditState::Drawing { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// The marquee rectangle being dragged, if any.
    pub fn marquee(&self) -> Option<Rect> {
        match self.state {
            EditState::MarqueeSelecting { origin, current, .. } => Some(Rect::from_corners(origin, current)),
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.events.push(event);
    }

    /// Feed one pointer event. Non-finite coordinates are rejected before
    /// they reach the state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<(), EditorError> {
        if !event.pos().is_finite() {
            log::warn!("Rejected pointer event with non-finite position: {:?}", event);
            return Err(EditorError::NonFiniteInput);
        }
        match event {
            PointerEvent::Down { pos, modifiers } => self.pointer_down(pos, modifiers),
            PointerEvent::Move { pos } => {
                self.events.push(EditorEvent::CursorMoved(pos));
                self.update_drag(pos);
            }
            PointerEvent::Up { pos } => self.pointer_up(pos),
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCommand) {
        if key == KeyCommand::Cancel {
            self.cancel();
            return;
        }
        if !matches!(self.state, EditState::Idle) {
            log::debug!("Ignoring {:?} during an active drag", key);
            return;
        }
        match key {
            KeyCommand::Delete => {
                self.delete_selected();
            }
            KeyCommand::SelectAll => self.toggle_select_all(),
            KeyCommand::Copy => {
                self.copy();
            }
            KeyCommand::Cut => {
                self.cut();
            }
            KeyCommand::Paste => {
                self.paste();
            }
            KeyCommand::Undo => {
                self.undo();
            }
            KeyCommand::Redo => {
                self.redo();
            }
            KeyCommand::Cancel => {}
        }
    }

    /// Cursor the host should show with the pointer at `pos`.
    pub fn hover_cursor(&self, pos: Point) -> CursorShape {
        match &self.state {
            EditState::Resizing { handle, .. } => grabber::cursor_for(*handle),
            EditState::Moving { .. } => CursorShape::Move,
            EditState::Panning { .. } => CursorShape::Grab,
            EditState::Drawing { .. } | EditState::MarqueeSelecting { .. } => CursorShape::Crosshair,
            EditState::Idle => match self.tool {
                Tool::Pan => CursorShape::Grab,
                _ => match self.hit_selected(pos) {
                    Some((_, Hit::Handle(handle))) => grabber::cursor_for(handle),
                    Some((_, Hit::Body)) => CursorShape::Move,
                    None if self.tool == Tool::Draw => CursorShape::Crosshair,
                    None => CursorShape::Default,
                },
            },
        }
    }

    fn pointer_down(&mut self, pos: Point, modifiers: Modifiers) {
        if !matches!(self.state, EditState::Idle) {
            log::debug!("Ignoring press during {:?}", self.state);
            return;
        }
        self.press_pos = Some(pos);
        self.pointer_moved = false;

        if self.tool == Tool::Pan {
            self.state = EditState::Panning { anchor: pos };
            return;
        }

        let multi = modifiers.multi_select && self.settings.selection_mode == SelectionMode::Multi;
        if multi {
            match self.boxes.topmost_at(pos).map(LabelBox::id) {
                Some(id) => {
                    let selected = self.boxes.get(id).is_some_and(|b| !b.is_selected());
                    self.boxes.set_selected(id, selected);
                    if selected {
                        self.emit_selected(id);
                    }
                }
                None if self.tool == Tool::Select => {
                    self.state = EditState::MarqueeSelecting {
                        origin: pos,
                        current: pos,
                        additive: true,
                    };
                }
                None => {}
            }
            return;
        }

        if let Some((id, hit)) = self.hit_selected(pos) {
            match hit {
                Hit::Handle(handle) => {
                    if let Some(original) = self.boxes.get(id).map(LabelBox::rect) {
                        self.state = EditState::Resizing { id, handle, original };
                    }
                }
                Hit::Body => self.begin_move(pos),
            }
            self.emit_selected(id);
            return;
        }

        match self.boxes.topmost_at(pos).map(LabelBox::id) {
            Some(id) => {
                self.boxes.select_only(&[id]);
                self.emit_selected(id);
                self.begin_move(pos);
            }
            None => {
                self.clear_selection();
                match self.tool {
                    Tool::Draw => self.begin_drawing(pos),
                    Tool::Select => {
                        self.state = EditState::MarqueeSelecting {
                            origin: pos,
                            current: pos,
                            additive: false,
                        };
                    }
                    Tool::Pan => {}
                }
            }
        }
    }

    fn begin_move(&mut self, pos: Point) {
        let origins = self.boxes.selected().map(|b| (b.id(), b.rect())).collect();
        self.state = EditState::Moving { last: pos, origins };
    }

    fn begin_drawing(&mut self, pos: Point) {
        let id = self.alloc_id();
        let mut pending = LabelBox::new(id, self.frame, self.classes.clone(), self.current_class);
        pending.set_rect(Rect::new(pos.x, pos.y, 0.0, 0.0));
        pending.set_selected(true);
        self.state = EditState::Drawing { anchor: pos, pending };
    }

    /// Update the geometry of the operation in progress for a pointer at `pos`.
    fn update_drag(&mut self, pos: Point) {
        if self.press_pos.is_some_and(|p| p != pos) {
            self.pointer_moved = true;
        }
        let bounds = self.frame.to_rect();
        let mut translate = None;
        match &mut self.state {
            EditState::Idle => {}
            EditState::Drawing { anchor, pending } => {
                // A drag entirely outside the frame leaves the box as it was.
                if let Some(rect) = Rect::from_corners(*anchor, pos).intersection(&bounds) {
                    pending.set_rect(rect);
                }
            }
            EditState::Moving { last, .. } => {
                translate = Some(pos - *last);
                *last = pos;
            }
            EditState::Resizing { id, handle, original } => {
                let clamped = Point::new(pos.x.clamp(0.0, bounds.right()), pos.y.clamp(0.0, bounds.bottom()));
                let rect = handle.drag(original, clamped);
                if let Some(b) = self.boxes.get_mut(*id) {
                    b.set_rect(rect);
                }
            }
            EditState::MarqueeSelecting { current, .. } => *current = pos,
            EditState::Panning { anchor } => {
                // The host scrolls by the delta, which puts the anchor back
                // under the pointer, so the anchor itself never changes.
                let delta = pos - *anchor;
                if !delta.is_zero() {
                    self.events.push(EditorEvent::Panned(delta));
                }
            }
        }
        if let Some(delta) = translate {
            self.translate_selected(delta);
        }
    }

    /// Move every selected box by `delta`, clamped so none leaves the frame.
    fn translate_selected(&mut self, delta: Vector) {
        let bounds = self.frame.to_rect();
        let clamped = self
            .boxes
            .selected()
            .fold(delta, |d, b| b.rect().clamp_translation(d, &bounds));
        if clamped.is_zero() {
            return;
        }
        for id in self.boxes.selected_ids() {
            if let Some(b) = self.boxes.get_mut(id) {
                let rect = b.rect().translate(clamped);
                b.set_rect(rect);
            }
        }
    }

    fn pointer_up(&mut self, pos: Point) {
        if !matches!(self.state, EditState::Panning { .. }) {
            self.update_drag(pos);
        }
        let was_click = self.press_pos.is_some() && !self.pointer_moved;
        self.press_pos = None;

        match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::Idle | EditState::Panning { .. } => {}
            EditState::Drawing { anchor, mut pending } => {
                match Rect::from_corners(anchor, pos).intersection(&self.frame.to_rect()) {
                    Some(rect) => {
                        pending.set_rect(rect);
                        self.finish_drawing(pending);
                    }
                    None => log::debug!("Discarding box drawn outside the image"),
                }
            }
            EditState::Moving { origins, .. } => {
                let changes: Vec<RectChange> = origins
                    .into_iter()
                    .filter_map(|(id, old)| {
                        let new = self.boxes.get(id)?.rect();
                        (new != old).then_some(RectChange { id, old, new })
                    })
                    .collect();
                if let Some(first) = changes.first().map(|c| c.id) {
                    log::info!("Moved {} boxes", changes.len());
                    self.history.push(Command::Move(changes), &mut self.boxes);
                    self.emit_selected(first);
                }
            }
            EditState::Resizing { id, original, .. } => {
                if let Some(new) = self.boxes.get(id).map(LabelBox::rect) {
                    if new.is_degenerate() {
                        log::debug!("Reverting collapsed resize of box {:?}", id);
                        if let Some(b) = self.boxes.get_mut(id) {
                            b.set_rect(original);
                        }
                    } else if new != original {
                        log::info!("Resized box {:?} to {:?}", id, new);
                        self.history
                            .push(Command::Resize(RectChange { id, old: original, new }), &mut self.boxes);
                        self.emit_selected(id);
                    }
                }
            }
            EditState::MarqueeSelecting { origin, current, additive } => {
                let area = Rect::from_corners(origin, current);
                let mut hits: Vec<BoxId> = self
                    .boxes
                    .iter()
                    .filter(|b| b.rect().intersects(&area))
                    .map(LabelBox::id)
                    .collect();
                if additive {
                    hits.extend(self.boxes.selected_ids());
                }
                self.select_ids(&hits);
            }
        }

        if was_click {
            self.paste.record_target(pos);
        }
    }

    fn finish_drawing(&mut self, pending: LabelBox) {
        let rect = pending.rect();
        let min = self.settings.min_box_size;
        if rect.width <= min || rect.height <= min {
            log::debug!("Discarding box {:?}: not larger than {}px", rect, min);
            return;
        }
        let id = pending.id();
        let command = Command::append(&self.boxes, vec![pending]);
        self.history.push(command, &mut self.boxes);
        self.boxes.select_only(&[id]);
        log::info!("Added box {:?} at {:?}", id, rect);
        self.emit_selected(id);
    }

    /// Abort the operation in progress, restoring any geometry it touched.
    pub fn cancel(&mut self) {
        match std::mem::replace(&mut self.state, EditState::Idle) {
            EditState::Idle => return,
            EditState::Drawing { .. } => log::debug!("Drawing cancelled"),
            EditState::Moving { origins, .. } => {
                for (id, rect) in origins {
                    if let Some(b) = self.boxes.get_mut(id) {
                        b.set_rect(rect);
                    }
                }
                log::debug!("Move cancelled");
            }
            EditState::Resizing { id, original, .. } => {
                if let Some(b) = self.boxes.get_mut(id) {
                    b.set_rect(original);
                }
                log::debug!("Resize cancelled");
            }
            EditState::MarqueeSelecting { .. } | EditState::Panning { .. } => {}
        }
        self.press_pos = None;
    }

    /// Topmost selected box with a handle or body at `pos`.
    fn hit_selected(&self, pos: Point) -> Option<(BoxId, Hit)> {
        let size = self.settings.handle_size;
        self.boxes
            .iter()
            .rev()
            .filter(|b| b.is_selected())
            .find_map(|b| b.hit_test(pos, size).map(|hit| (b.id(), hit)))
    }

    /// Replace the selection, honouring the selection mode.
    fn select_ids(&mut self, ids: &[BoxId]) {
        let ids = match self.settings.selection_mode {
            SelectionMode::Single => &ids[ids.len().saturating_sub(1)..],
            SelectionMode::Multi => ids,
        };
        self.boxes.select_only(ids);
        match ids {
            [] => self.events.push(EditorEvent::SelectionCleared),
            [.., last] => self.emit_selected(*last),
        }
    }

    /// Select a box from outside the canvas, e.g. a list in a side panel.
    pub fn select_box(&mut self, id: BoxId, additive: bool) {
        if self.boxes.get(id).is_none() {
            return;
        }
        let mut ids = if additive { self.boxes.selected_ids() } else { Vec::new() };
        ids.retain(|i| *i != id);
        ids.push(id);
        self.select_ids(&ids);
    }

    pub fn clear_selection(&mut self) {
        if self.boxes.selected_count() > 0 {
            self.boxes.clear_selection();
            self.events.push(EditorEvent::SelectionCleared);
        }
    }

    fn toggle_select_all(&mut self) {
        if self.settings.selection_mode == SelectionMode::Single {
            log::debug!("Select all is unavailable in single selection mode");
            return;
        }
        if !self.boxes.is_empty() && self.boxes.selected_count() == self.boxes.len() {
            self.clear_selection();
        } else {
            let ids: Vec<BoxId> = self.boxes.iter().map(LabelBox::id).collect();
            self.select_ids(&ids);
        }
    }

    /// Remove the selected boxes. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.boxes.selected_ids();
        if ids.is_empty() {
            return 0;
        }
        let command = Command::remove(&self.boxes, &ids);
        self.history.push(command, &mut self.boxes);
        self.events.push(EditorEvent::SelectionCleared);
        log::info!("Deleted {} boxes, {} remaining", ids.len(), self.boxes.len());
        ids.len()
    }

    /// Change the class used for new boxes and retype the selection.
    pub fn change_class(&mut self, name: &str) -> Result<(), EditorError> {
        let index = self
            .classes
            .index_of(name)
            .ok_or_else(|| EditorError::ClassNotFound(name.to_string()))?;
        self.current_class = index;
        let changes: Vec<ClassChange> = self
            .boxes
            .selected()
            .filter(|b| b.class_id() != index)
            .map(|b| ClassChange {
                id: b.id(),
                old: b.class_id(),
                new: index,
            })
            .collect();
        if let Some(last) = changes.last().map(|c| c.id) {
            log::info!("Changed class of {} boxes to {}", changes.len(), name);
            self.history.push(Command::Retype(changes), &mut self.boxes);
            self.emit_selected(last);
        }
        Ok(())
    }

    /// Copy the selected boxes to the clipboard. Returns how many were copied.
    pub fn copy(&mut self) -> usize {
        let Some(bundle) = Bundle::from_boxes(self.boxes.selected()) else {
            return 0;
        };
        match bundle.to_text() {
            Ok(text) => self.clipboard.put(text),
            Err(e) => {
                log::warn!("Failed to serialize clipboard bundle: {}", e);
                return 0;
            }
        }
        self.paste.reset(bundle.len());
        log::info!("Copied {} boxes", bundle.len());
        bundle.len()
    }

    /// Copy, then remove the originals in one undoable step.
    pub fn cut(&mut self) -> usize {
        let copied = self.copy();
        if copied > 0 {
            self.delete_selected();
        }
        copied
    }

    /// Serialized bundle from the last copy, for mirroring to the system
    /// clipboard.
    pub fn clipboard_text(&self) -> Option<String> {
        self.clipboard.get()
    }

    /// Paste from text delivered by the system clipboard. Text holding a
    /// different bundle replaces the clipboard contents first; any other
    /// text pastes whatever the clipboard already holds.
    pub fn paste_text(&mut self, text: &str) -> usize {
        if !matches!(self.state, EditState::Idle) {
            log::debug!("Ignoring paste during an active drag");
            return 0;
        }
        if let Some(bundle) = Bundle::from_text(text) {
            if self.clipboard.get().as_deref() != Some(text) {
                self.clipboard.put(text.to_string());
                self.paste.restart(bundle.len());
            }
        }
        self.paste()
    }

    /// Paste the clipboard bundle as new selected boxes. Returns how many
    /// were pasted; clipboard content that is not a bundle pastes nothing.
    pub fn paste(&mut self) -> usize {
        let Some(bundle) = self.clipboard.get().as_deref().and_then(Bundle::from_text) else {
            log::debug!("Nothing to paste");
            return 0;
        };
        let bounds = self.frame.to_rect();
        let placements = self.paste.next_placements(&bundle, self.settings.paste_offset);
        let mut items = Vec::with_capacity(placements.len());
        for (entry, rect) in bundle.entries().iter().zip(placements) {
            let rect = rect.translate(rect.clamp_translation(Vector::default(), &bounds));
            if rect.is_degenerate() {
                continue;
            }
            let mut b = LabelBox::new(self.alloc_id(), self.frame, self.classes.clone(), entry.class_id);
            b.set_rect(rect);
            items.push(b);
        }
        if items.is_empty() {
            return 0;
        }
        let ids: Vec<BoxId> = items.iter().map(LabelBox::id).collect();
        let command = Command::append(&self.boxes, items);
        self.history.push(command, &mut self.boxes);
        self.select_ids(&ids);
        log::info!("Pasted {} boxes", ids.len());
        ids.len()
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.boxes);
        if changed {
            self.clear_selection();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.boxes);
        if changed {
            self.clear_selection();
        }
        changed
    }

    /// Forget the undo history without replaying it.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Label records for every box worth persisting.
    pub fn records(&self) -> Vec<LabelRecord> {
        self.boxes.records()
    }

    fn emit_selected(&mut self, id: BoxId) {
        if let Some(b) = self.boxes.get(id) {
            self.events.push(EditorEvent::BoxSelected {
                id,
                rect: b.rect(),
                class_name: b.class_name(),
            });
        }
    }

    fn alloc_id(&mut self) -> BoxId {
        let id = BoxId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditSession {
        let classes = ClassList::new(vec!["car".into(), "person".into()]);
        let mut s = EditSession::new(Size::new(1000.0, 500.0), classes, SessionSettings::default());
        s.set_tool(Tool::Draw);
        s
    }

    fn down(s: &mut EditSession, x: f64, y: f64) {
        s.handle_pointer(PointerEvent::Down {
            pos: Point::new(x, y),
            modifiers: Modifiers::default(),
        })
        .unwrap();
    }

    fn ctrl_click(s: &mut EditSession, x: f64, y: f64) {
        let pos = Point::new(x, y);
        s.handle_pointer(PointerEvent::Down {
            pos,
            modifiers: Modifiers { multi_select: true },
        })
        .unwrap();
        s.handle_pointer(PointerEvent::Up { pos }).unwrap();
    }

    fn move_to(s: &mut EditSession, x: f64, y: f64) {
        s.handle_pointer(PointerEvent::Move { pos: Point::new(x, y) }).unwrap();
    }

    fn up(s: &mut EditSession, x: f64, y: f64) {
        s.handle_pointer(PointerEvent::Up { pos: Point::new(x, y) }).unwrap();
    }

    fn drag(s: &mut EditSession, from: (f64, f64), to: (f64, f64)) {
        down(s, from.0, from.1);
        move_to(s, to.0, to.1);
        up(s, to.0, to.1);
    }

    fn click(s: &mut EditSession, x: f64, y: f64) {
        down(s, x, y);
        up(s, x, y);
    }

    fn rects(s: &EditSession) -> Vec<Rect> {
        s.boxes().iter().map(LabelBox::rect).collect()
    }

    fn snapshot(s: &EditSession) -> Vec<(BoxId, Rect, usize)> {
        s.boxes().iter().map(|b| (b.id(), b.rect(), b.class_id())).collect()
    }

    #[test]
    fn test_draw_uses_anchor_and_final_point_only() {
        let mut s = session();
        down(&mut s, 10.0, 10.0);
        move_to(&mut s, 50.0, 80.0);
        move_to(&mut s, 300.0, 2.0);
        move_to(&mut s, 2.0, 2.0);
        up(&mut s, 2.0, 2.0);

        assert_eq!(rects(&s), vec![Rect::new(2.0, 2.0, 8.0, 8.0)]);
        assert!(s.can_undo());
        assert!(matches!(s.state(), EditState::Idle));
        assert_eq!(s.boxes().selected_count(), 1);
    }

    #[test]
    fn test_draw_outside_frame_adds_nothing() {
        let mut s = session();
        drag(&mut s, (-50.0, -50.0), (-20.0, -30.0));
        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_draw_ending_outside_frame_ignores_path() {
        let mut s = session();
        down(&mut s, -50.0, -50.0);
        move_to(&mut s, 100.0, 100.0);
        move_to(&mut s, -20.0, -20.0);
        up(&mut s, -20.0, -20.0);
        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_small_boxes_are_discarded() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (104.0, 140.0));
        drag(&mut s, (100.0, 100.0), (105.0, 105.0));
        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_draw_is_clamped_to_frame() {
        let mut s = session();
        drag(&mut s, (990.0, 490.0), (1100.0, 600.0));
        assert_eq!(rects(&s), vec![Rect::new(990.0, 490.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_new_boxes_use_current_class() {
        let mut s = session();
        s.change_class("person").unwrap();
        drag(&mut s, (10.0, 10.0), (60.0, 60.0));
        assert_eq!(s.boxes().iter().next().unwrap().class_name().as_deref(), Some("person"));
    }

    #[test]
    fn test_move_clamps_and_undoes() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        drag(&mut s, (120.0, 120.0), (1200.0, 130.0));
        assert_eq!(rects(&s), vec![Rect::new(950.0, 110.0, 50.0, 50.0)]);

        assert!(s.undo());
        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 50.0, 50.0)]);
        assert!(s.redo());
        assert_eq!(rects(&s), vec![Rect::new(950.0, 110.0, 50.0, 50.0)]);
    }

    #[test]
    fn test_click_without_motion_records_no_move() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        click(&mut s, 120.0, 120.0);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn test_moving_multi_selection_moves_together() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        drag(&mut s, (300.0, 100.0), (350.0, 150.0));
        ctrl_click(&mut s, 120.0, 120.0);
        assert_eq!(s.boxes().selected_count(), 2);

        drag(&mut s, (320.0, 120.0), (330.0, 140.0));
        assert_eq!(
            rects(&s),
            vec![Rect::new(110.0, 120.0, 50.0, 50.0), Rect::new(310.0, 120.0, 50.0, 50.0)]
        );
        s.undo();
        assert_eq!(
            rects(&s),
            vec![Rect::new(100.0, 100.0, 50.0, 50.0), Rect::new(300.0, 100.0, 50.0, 50.0)]
        );
    }

    #[test]
    fn test_resize_past_opposite_corner() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        drag(&mut s, (100.0, 100.0), (200.0, 220.0));
        assert_eq!(rects(&s), vec![Rect::new(150.0, 150.0, 50.0, 70.0)]);

        s.undo();
        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 50.0, 50.0)]);
    }

    #[test]
    fn test_edge_handle_moves_one_edge() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        // Right-center handle sits at (150, 125).
        drag(&mut s, (151.0, 125.0), (180.0, 400.0));
        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 80.0, 50.0)]);
    }

    #[test]
    fn test_collapsing_resize_reverts() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        drag(&mut s, (151.0, 125.0), (100.0, 125.0));
        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 50.0, 50.0)]);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn test_cancel_restores_rect_without_command() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        down(&mut s, 150.0, 150.0);
        move_to(&mut s, 300.0, 300.0);
        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 200.0, 200.0)]);
        s.handle_key(KeyCommand::Cancel);
        up(&mut s, 300.0, 300.0);

        assert_eq!(rects(&s), vec![Rect::new(100.0, 100.0, 50.0, 50.0)]);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn test_cancel_drawing_discards_box() {
        let mut s = session();
        down(&mut s, 10.0, 10.0);
        move_to(&mut s, 100.0, 100.0);
        s.handle_key(KeyCommand::Cancel);
        up(&mut s, 100.0, 100.0);
        assert!(s.boxes().is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut s = session();
        let err = s
            .handle_pointer(PointerEvent::Down {
                pos: Point::new(f64::NAN, 1.0),
                modifiers: Modifiers::default(),
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::NonFiniteInput));
        assert!(matches!(s.state(), EditState::Idle));
    }

    #[test]
    fn test_delete_and_undo_restore_order() {
        let mut s = session();
        drag(&mut s, (10.0, 10.0), (60.0, 60.0));
        drag(&mut s, (100.0, 10.0), (160.0, 60.0));
        drag(&mut s, (200.0, 10.0), (260.0, 60.0));
        let before = snapshot(&s);

        click(&mut s, 130.0, 30.0);
        s.handle_key(KeyCommand::Delete);
        assert_eq!(s.boxes().len(), 2);

        s.handle_key(KeyCommand::Undo);
        assert_eq!(snapshot(&s), before);
    }

    #[test]
    fn test_select_all_toggles() {
        let mut s = session();
        drag(&mut s, (10.0, 10.0), (60.0, 60.0));
        drag(&mut s, (100.0, 10.0), (160.0, 60.0));
        s.handle_key(KeyCommand::SelectAll);
        assert_eq!(s.boxes().selected_count(), 2);
        s.handle_key(KeyCommand::SelectAll);
        assert_eq!(s.boxes().selected_count(), 0);
    }

    #[test]
    fn test_single_mode_keeps_one_selected() {
        let classes = ClassList::new(vec!["car".into()]);
        let settings = SessionSettings {
            selection_mode: SelectionMode::Single,
            ..SessionSettings::default()
        };
        let mut s = EditSession::new(Size::new(1000.0, 500.0), classes, settings);
        s.set_tool(Tool::Draw);
        drag(&mut s, (10.0, 10.0), (60.0, 60.0));
        drag(&mut s, (100.0, 10.0), (160.0, 60.0));

        ctrl_click(&mut s, 30.0, 30.0);
        assert_eq!(s.boxes().selected_count(), 1);
        s.handle_key(KeyCommand::SelectAll);
        assert_eq!(s.boxes().selected_count(), 1);
    }

    #[test]
    fn test_marquee_selects_intersecting_boxes() {
        let mut s = session();
        drag(&mut s, (10.0, 10.0), (60.0, 60.0));
        drag(&mut s, (100.0, 10.0), (160.0, 60.0));
        drag(&mut s, (300.0, 300.0), (360.0, 360.0));
        s.set_tool(Tool::Select);

        down(&mut s, 0.0, 0.0);
        move_to(&mut s, 120.0, 40.0);
        assert_eq!(s.marquee(), Some(Rect::new(0.0, 0.0, 120.0, 40.0)));
        up(&mut s, 120.0, 40.0);

        let selected: Vec<BoxId> = s.boxes().selected_ids();
        assert_eq!(selected.len(), 2);
        assert!(s.marquee().is_none());
    }

    #[test]
    fn test_copy_paste_twice_offsets_twenty() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        drag(&mut s, (200.0, 150.0), (240.0, 190.0));
        ctrl_click(&mut s, 120.0, 120.0);
        assert_eq!(s.copy(), 2);

        assert_eq!(s.paste(), 2);
        assert_eq!(s.paste(), 2);
        let all = rects(&s);
        assert_eq!(all.len(), 6);
        assert_eq!(all[4], Rect::new(120.0, 120.0, 50.0, 50.0));
        assert_eq!(all[5], Rect::new(220.0, 170.0, 40.0, 40.0));
        assert_eq!(s.boxes().selected_count(), 2);
    }

    #[test]
    fn test_paste_at_clicked_position() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        s.handle_key(KeyCommand::Copy);
        click(&mut s, 500.0, 300.0);
        s.handle_key(KeyCommand::Paste);
        assert_eq!(rects(&s)[1], Rect::new(475.0, 275.0, 50.0, 50.0));
    }

    #[test]
    fn test_paste_keeps_boxes_inside_frame() {
        let mut s = session();
        drag(&mut s, (900.0, 400.0), (990.0, 490.0));
        s.copy();
        s.paste();
        s.paste();
        assert_eq!(rects(&s)[1], Rect::new(910.0, 410.0, 90.0, 90.0));
        assert_eq!(rects(&s)[2], Rect::new(910.0, 410.0, 90.0, 90.0));
    }

    #[test]
    fn test_cut_then_undo_restores_originals() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        let before = snapshot(&s);
        s.handle_key(KeyCommand::Cut);
        assert!(s.boxes().is_empty());

        s.handle_key(KeyCommand::Undo);
        assert_eq!(snapshot(&s), before);

        s.handle_key(KeyCommand::Paste);
        assert_eq!(s.boxes().len(), 2);
    }

    #[test]
    fn test_foreign_clipboard_content_pastes_nothing() {
        let mut clipboard = MemoryClipboard::default();
        clipboard.put("some text".to_string());
        let mut s = session().with_clipboard(clipboard);
        assert_eq!(s.paste(), 0);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_shared_clipboard_across_sessions() {
        let clipboard = MemoryClipboard::default();
        let mut a = session().with_clipboard(clipboard.clone());
        drag(&mut a, (100.0, 100.0), (150.0, 150.0));
        a.copy();

        let mut b = session().with_clipboard(clipboard);
        assert_eq!(b.paste(), 1);
        assert_eq!(rects(&b), vec![Rect::new(110.0, 110.0, 50.0, 50.0)]);
    }

    #[test]
    fn test_paste_text_from_system_clipboard() {
        let mut a = session();
        drag(&mut a, (100.0, 100.0), (150.0, 150.0));
        a.copy();
        let text = a.clipboard_text().unwrap();

        let mut b = session();
        assert_eq!(b.paste_text(&text), 1);
        assert_eq!(b.paste_text(&text), 1);
        assert_eq!(
            rects(&b),
            vec![Rect::new(110.0, 110.0, 50.0, 50.0), Rect::new(120.0, 120.0, 50.0, 50.0)]
        );
    }

    #[test]
    fn test_plain_system_text_pastes_copied_boxes() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        s.copy();
        assert_eq!(s.paste_text("hello"), 1);
        assert_eq!(rects(&s)[1], Rect::new(110.0, 110.0, 50.0, 50.0));
        assert_eq!(s.clipboard_text().and_then(|t| Bundle::from_text(&t)).map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_change_class_unknown_name() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        let err = s.change_class("truck").unwrap_err();
        assert!(matches!(err, EditorError::ClassNotFound(_)));
        assert_eq!(s.boxes().iter().next().unwrap().class_id(), 0);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn test_undo_redo_every_command_kind() {
        let mut s = session();
        let mut states = vec![snapshot(&s)];

        drag(&mut s, (100.0, 100.0), (150.0, 150.0)); // add
        states.push(snapshot(&s));
        drag(&mut s, (120.0, 120.0), (140.0, 160.0)); // move
        states.push(snapshot(&s));
        drag(&mut s, (170.0, 190.0), (200.0, 200.0)); // resize bottom-right
        states.push(snapshot(&s));
        s.change_class("person").unwrap(); // retype
        states.push(snapshot(&s));
        s.handle_key(KeyCommand::Delete); // remove
        states.push(snapshot(&s));
        assert_eq!(s.history().undo_len(), 5);

        for expected in states.iter().rev().skip(1) {
            assert!(s.undo());
            assert_eq!(&snapshot(&s), expected);
        }
        assert!(!s.undo());

        for expected in states.iter().skip(1) {
            assert!(s.redo());
            assert_eq!(&snapshot(&s), expected);
        }
        assert!(!s.redo());
    }

    #[test]
    fn test_events_report_cursor_and_selection() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        let events = s.drain_events();
        assert!(events.contains(&EditorEvent::CursorMoved(Point::new(150.0, 150.0))));
        assert!(events.iter().any(|e| matches!(
            e,
            EditorEvent::BoxSelected { rect, class_name, .. }
                if *rect == Rect::new(100.0, 100.0, 50.0, 50.0) && class_name.as_deref() == Some("car")
        )));
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_pan_reports_offset_from_anchor() {
        let mut s = session();
        s.set_tool(Tool::Pan);
        down(&mut s, 100.0, 100.0);
        move_to(&mut s, 110.0, 95.0);
        up(&mut s, 110.0, 95.0);
        let events = s.drain_events();
        assert!(events.contains(&EditorEvent::Panned(Vector::new(10.0, -5.0))));
        assert!(s.boxes().is_empty());
    }

    #[test]
    fn test_hover_cursor_over_selected_box() {
        let mut s = session();
        drag(&mut s, (100.0, 100.0), (150.0, 150.0));
        assert_eq!(s.hover_cursor(Point::new(100.0, 100.0)), CursorShape::ResizeNwSe);
        assert_eq!(s.hover_cursor(Point::new(125.0, 125.0)), CursorShape::Move);
        assert_eq!(s.hover_cursor(Point::new(400.0, 400.0)), CursorShape::Crosshair);
    }

    #[test]
    fn test_load_records_skips_degenerate() {
        let mut s = session();
        let records = crate::io::labels::parse_labels("0 0.5 0.5 0.2 0.4\n1 0.5 0.5 0.0 0.4\n");
        s.load_records(&records);
        assert_eq!(rects(&s), vec![Rect::new(400.0, 150.0, 200.0, 200.0)]);
        assert!(!s.can_undo());
    }
}
