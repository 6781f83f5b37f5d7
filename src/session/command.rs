// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Reversible edit commands.
//!
//! Each command carries the before and after state it needs, so applying
//! and inverting never recomputes anything from the current geometry.

use crate::models::annotation::{BoxId, BoxSet, LabelBox};
use crate::util::geometry::Rect;

/// A box together with its position in the working set.
#[derive(Debug, Clone)]
pub struct PlacedBox {
    pub index: usize,
    pub item: LabelBox,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectChange {
    pub id: BoxId,
    pub old: Rect,
    pub new: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassChange {
    pub id: BoxId,
    pub old: usize,
    pub new: usize,
}

#[derive(Debug, Clone)]
pub enum Command {
    /// Insert boxes, ascending by index.
    Add(Vec<PlacedBox>),
    /// Remove boxes, ascending by their index before removal.
    Remove(Vec<PlacedBox>),
    /// Translate one or more boxes.
    Move(Vec<RectChange>),
    /// Reshape a single box.
    Resize(RectChange),
    /// Change the class of one or more boxes.
    Retype(Vec<ClassChange>),
}

impl Command {
    /// Build an `Add` that appends `items` to the end of `boxes`.
    pub fn append(boxes: &BoxSet, items: Vec<LabelBox>) -> Command {
        let start = boxes.len();
        Command::Add(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| PlacedBox { index: start + i, item: deselected(item) })
                .collect(),
        )
    }

    /// Build a `Remove` for `ids`, capturing where each box currently sits.
    pub fn remove(boxes: &BoxSet, ids: &[BoxId]) -> Command {
        let mut placed: Vec<PlacedBox> = ids
            .iter()
            .filter_map(|id| {
                let index = boxes.position(*id)?;
                let item = boxes.get(*id)?.clone();
                Some(PlacedBox { index, item: deselected(item) })
            })
            .collect();
        placed.sort_by_key(|p| p.index);
        Command::Remove(placed)
    }

    /// Human readable name for logs and menus.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Remove(_) => "remove",
            Command::Move(_) => "move",
            Command::Resize(_) => "resize",
            Command::Retype(_) => "change class",
        }
    }

    pub fn apply(&self, boxes: &mut BoxSet) {
        match self {
            Command::Add(items) => insert_all(boxes, items),
            Command::Remove(items) => remove_all(boxes, items),
            Command::Move(changes) => {
                for c in changes {
                    set_rect(boxes, c.id, c.new);
                }
            }
            Command::Resize(c) => set_rect(boxes, c.id, c.new),
            Command::Retype(changes) => {
                for c in changes {
                    set_class(boxes, c.id, c.new);
                }
            }
        }
    }

    pub fn invert(&self, boxes: &mut BoxSet) {
        match self {
            Command::Add(items) => remove_all(boxes, items),
            Command::Remove(items) => insert_all(boxes, items),
            Command::Move(changes) => {
                for c in changes {
                    set_rect(boxes, c.id, c.old);
                }
            }
            Command::Resize(c) => set_rect(boxes, c.id, c.old),
            Command::Retype(changes) => {
                for c in changes {
                    set_class(boxes, c.id, c.old);
                }
            }
        }
    }
}

fn deselected(mut item: LabelBox) -> LabelBox {
    item.set_selected(false);
    item
}

fn insert_all(boxes: &mut BoxSet, items: &[PlacedBox]) {
    for p in items {
        if boxes.get(p.item.id()).is_none() {
            boxes.insert(p.index, p.item.clone());
        }
    }
}

fn remove_all(boxes: &mut BoxSet, items: &[PlacedBox]) {
    for p in items.iter().rev() {
        boxes.remove(p.item.id());
    }
}

fn set_rect(boxes: &mut BoxSet, id: BoxId, rect: Rect) {
    match boxes.get_mut(id) {
        Some(b) => b.set_rect(rect),
        None => log::warn!("Command refers to missing box {:?}", id),
    }
}

fn set_class(boxes: &mut BoxSet, id: BoxId, class_id: usize) {
    match boxes.get_mut(id) {
        Some(b) => b.set_class_id(class_id),
        None => log::warn!("Command refers to missing box {:?}", id),
    }
}
