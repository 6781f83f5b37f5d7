// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the labelled bounding box, the normalized record
//! it is persisted as, and the ordered working set the editor mutates.

use super::classes::ClassList;
use super::grabber::{self, Hit};
use crate::error::EditorError;
use crate::util::geometry::{denormalize_rect, normalize_rect, NormalizedRect, Point, Rect, Size};

/// Stable identity of a box within an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub u64);

/// One line of a label file: class index plus normalized geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRecord {
    pub class_id: usize,
    pub rect: NormalizedRect,
}

/// A labelled bounding box in image pixel coordinates.
#[derive(Debug, Clone)]
pub struct LabelBox {
    id: BoxId,
    rect: Rect,
    frame: Size,
    class_id: usize,
    classes: ClassList,
    selected: bool,
}

impl LabelBox {
    /// Create a zero-size box at the origin.
    pub fn new(id: BoxId, frame: Size, classes: ClassList, class_id: usize) -> Self {
        Self {
            id,
            rect: Rect::default(),
            frame,
            class_id,
            classes,
            selected: false,
        }
    }

    /// Create a box from a label file record.
    pub fn from_record(id: BoxId, record: &LabelRecord, frame: Size, classes: ClassList) -> Self {
        let mut b = Self::new(id, frame, classes, record.class_id);
        b.set_rect(denormalize_rect(&record.rect, frame));
        b
    }

    pub fn id(&self) -> BoxId {
        self.id
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Replace the geometry. Negative sizes are flipped.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = Rect::new(rect.x, rect.y, rect.width, rect.height);
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    /// The class name, or `None` if the index no longer resolves.
    pub fn class_name(&self) -> Option<String> {
        self.classes.name(self.class_id)
    }

    /// Change the class by name. Unknown names leave the class untouched.
    pub fn set_class_name(&mut self, name: &str) -> Result<(), EditorError> {
        let index = self
            .classes
            .index_of(name)
            .ok_or_else(|| EditorError::ClassNotFound(name.to_string()))?;
        self.class_id = index;
        Ok(())
    }

    pub(crate) fn set_class_id(&mut self, class_id: usize) {
        self.class_id = class_id;
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Geometry as fractions of the reference frame.
    pub fn normalized_rect(&self) -> NormalizedRect {
        normalize_rect(&self.rect, self.frame)
    }

    pub fn hit_test(&self, point: Point, handle_size: f64) -> Option<Hit> {
        grabber::classify(&self.rect, point, handle_size)
    }

    /// The record to persist. Degenerate boxes have none.
    pub fn to_record(&self) -> Result<LabelRecord, EditorError> {
        if self.rect.is_degenerate() {
            return Err(EditorError::DegenerateGeometry);
        }
        Ok(LabelRecord {
            class_id: self.class_id,
            rect: self.normalized_rect(),
        })
    }
}

/// The ordered working set of boxes. Order is drawing order: later boxes
/// are on top and win hit tests.
#[derive(Debug, Clone, Default)]
pub struct BoxSet {
    boxes: Vec<LabelBox>,
}

impl BoxSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelBox> {
        self.boxes.iter()
    }

    pub fn get(&self, id: BoxId) -> Option<&LabelBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut LabelBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    pub fn position(&self, id: BoxId) -> Option<usize> {
        self.boxes.iter().position(|b| b.id == id)
    }

    pub fn push(&mut self, b: LabelBox) {
        self.boxes.push(b);
    }

    /// Insert at `index`, clamped to the end of the set.
    pub fn insert(&mut self, index: usize, b: LabelBox) {
        let index = index.min(self.boxes.len());
        self.boxes.insert(index, b);
    }

    pub fn remove(&mut self, id: BoxId) -> Option<LabelBox> {
        let index = self.position(id)?;
        Some(self.boxes.remove(index))
    }

    /// Topmost box whose body contains `point`.
    pub fn topmost_at(&self, point: Point) -> Option<&LabelBox> {
        self.boxes.iter().rev().find(|b| b.rect.contains(point))
    }

    pub fn selected(&self) -> impl Iterator<Item = &LabelBox> {
        self.boxes.iter().filter(|b| b.selected)
    }

    pub fn selected_ids(&self) -> Vec<BoxId> {
        self.selected().map(|b| b.id).collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    pub fn clear_selection(&mut self) {
        for b in &mut self.boxes {
            b.selected = false;
        }
    }

    /// Select exactly the boxes in `ids`.
    pub fn select_only(&mut self, ids: &[BoxId]) {
        for b in &mut self.boxes {
            b.selected = ids.contains(&b.id);
        }
    }

    pub fn set_selected(&mut self, id: BoxId, selected: bool) {
        if let Some(b) = self.get_mut(id) {
            b.selected = selected;
        }
    }

    /// Label records for every non-degenerate box, in set order.
    pub fn records(&self) -> Vec<LabelRecord> {
        self.boxes.iter().filter_map(|b| b.to_record().ok()).collect()
    }
}
