// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Copy, cut and paste of boxes.
//!
//! Copying snapshots the selected boxes into a [`Bundle`], serialized as
//! JSON onto a [`Clipboard`]. Pasting places the bundle either centered
//! on the last clicked position or shifted from the previous placement so
//! repeated pastes do not stack exactly on top of each other.

use crate::models::annotation::LabelBox;
use crate::util::geometry::{Point, Rect, Vector};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Default shift applied by each untargeted paste.
pub const DEFAULT_PASTE_OFFSET: f64 = 10.0;

const BUNDLE_KIND: &str = "boxmark/bundle";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub rect: Rect,
    pub class_id: usize,
}

/// Snapshot of copied boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bundle {
    kind: String,
    entries: Vec<BundleEntry>,
    /// Offset of each entry's top-left corner from the union's top-left.
    offsets: Vec<Vector>,
}

impl Bundle {
    /// Snapshot `boxes`. Returns `None` when there is nothing to copy.
    pub fn from_boxes<'a>(boxes: impl IntoIterator<Item = &'a LabelBox>) -> Option<Bundle> {
        let entries: Vec<BundleEntry> = boxes
            .into_iter()
            .map(|b| BundleEntry {
                rect: b.rect(),
                class_id: b.class_id(),
            })
            .collect();
        let union = union_of(&entries)?;
        let offsets = entries
            .iter()
            .map(|e| e.rect.top_left() - union.top_left())
            .collect();
        Some(Bundle {
            kind: BUNDLE_KIND.to_string(),
            entries,
            offsets,
        })
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    pub fn offsets(&self) -> &[Vector] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounding box of every entry.
    pub fn union(&self) -> Option<Rect> {
        union_of(&self.entries)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse clipboard text. Anything that is not a bundle yields `None`.
    pub fn from_text(text: &str) -> Option<Bundle> {
        let bundle: Bundle = match serde_json::from_str(text) {
            Ok(b) => b,
            Err(e) => {
                log::debug!("Clipboard does not hold a box bundle: {}", e);
                return None;
            }
        };
        let well_formed = bundle.kind == BUNDLE_KIND
            && bundle.entries.len() == bundle.offsets.len()
            && !bundle.is_empty()
            && bundle.entries.iter().all(|e| e.rect.is_finite());
        well_formed.then_some(bundle)
    }
}

fn union_of(entries: &[BundleEntry]) -> Option<Rect> {
    let mut rects = entries.iter().map(|e| e.rect);
    let first = rects.next()?;
    Some(rects.fold(first, |acc, r| acc.union(&r)))
}

/// Opaque text storage for serialized bundles.
pub trait Clipboard {
    fn put(&mut self, text: String);
    fn get(&self) -> Option<String>;
}

/// In-process clipboard. Clones share the same slot, so one clipboard can
/// outlive individual edit sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    slot: Rc<RefCell<Option<String>>>,
}

impl Clipboard for MemoryClipboard {
    fn put(&mut self, text: String) {
        *self.slot.borrow_mut() = Some(text);
    }

    fn get(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

/// Where the next paste lands.
#[derive(Debug, Clone, Default)]
pub struct PasteTracker {
    /// Top-left of each entry's last placement; `None` until first paste.
    positions: Vec<Option<Point>>,
    /// Position clicked since the last copy, consumed by the next paste.
    target: Option<Point>,
}

impl PasteTracker {
    /// Forget previous placements for a freshly copied bundle of `len` boxes.
    pub fn reset(&mut self, len: usize) {
        self.restart(len);
        self.target = None;
    }

    /// Forget previous placements but keep any pending paste target.
    pub fn restart(&mut self, len: usize) {
        self.positions = vec![None; len];
    }

    pub fn record_target(&mut self, pos: Point) {
        self.target = Some(pos);
    }

    /// Compute the rectangles for the next paste of `bundle`.
    pub fn next_placements(&mut self, bundle: &Bundle, offset: f64) -> Vec<Rect> {
        if self.positions.len() != bundle.len() {
            self.positions = vec![None; bundle.len()];
        }
        for (pos, entry) in self.positions.iter_mut().zip(bundle.entries()) {
            pos.get_or_insert(entry.rect.top_left());
        }

        match (self.target.take(), bundle.union()) {
            (Some(target), Some(union)) => {
                let origin = union.with_center(target).top_left();
                for (pos, delta) in self.positions.iter_mut().zip(bundle.offsets()) {
                    *pos = Some(origin + *delta);
                }
            }
            _ => {
                let shift = Vector::new(offset, offset);
                for pos in self.positions.iter_mut().flatten() {
                    *pos += shift;
                }
            }
        }

        bundle
            .entries()
            .iter()
            .zip(&self.positions)
            .map(|(entry, pos)| match pos {
                Some(p) => entry.rect.with_top_left(*p),
                None => entry.rect,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::BoxId;
    use crate::models::classes::ClassList;
    use crate::util::geometry::Size;

    fn boxes() -> Vec<LabelBox> {
        let classes = ClassList::new(vec!["a".into(), "b".into()]);
        let frame = Size::new(1000.0, 1000.0);
        let mut a = LabelBox::new(BoxId(1), frame, classes.clone(), 0);
        a.set_rect(Rect::new(100.0, 100.0, 50.0, 50.0));
        let mut b = LabelBox::new(BoxId(2), frame, classes, 1);
        b.set_rect(Rect::new(200.0, 150.0, 40.0, 40.0));
        vec![a, b]
    }

    #[test]
    fn test_bundle_offsets_from_union() {
        let bundle = Bundle::from_boxes(&boxes()).unwrap();
        assert_eq!(bundle.union(), Some(Rect::new(100.0, 100.0, 140.0, 90.0)));
        assert_eq!(bundle.offsets(), &[Vector::new(0.0, 0.0), Vector::new(100.0, 50.0)]);
        assert_eq!(bundle.entries()[1].class_id, 1);
    }

    #[test]
    fn test_empty_selection_has_no_bundle() {
        assert!(Bundle::from_boxes(&Vec::<LabelBox>::new()).is_none());
    }

    #[test]
    fn test_bundle_survives_clipboard_text() {
        let bundle = Bundle::from_boxes(&boxes()).unwrap();
        let mut clipboard = MemoryClipboard::default();
        clipboard.put(bundle.to_text().unwrap());
        let back = Bundle::from_text(&clipboard.get().unwrap()).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn test_foreign_clipboard_text_is_rejected() {
        assert!(Bundle::from_text("hello").is_none());
        assert!(Bundle::from_text("{\"entries\": []}").is_none());
        assert!(Bundle::from_text("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_repeated_paste_accumulates_offset() {
        let bundle = Bundle::from_boxes(&boxes()).unwrap();
        let mut tracker = PasteTracker::default();
        tracker.reset(bundle.len());

        let first = tracker.next_placements(&bundle, 10.0);
        assert_eq!(first[0], Rect::new(110.0, 110.0, 50.0, 50.0));
        let second = tracker.next_placements(&bundle, 10.0);
        assert_eq!(second[0], Rect::new(120.0, 120.0, 50.0, 50.0));
        assert_eq!(second[1], Rect::new(220.0, 170.0, 40.0, 40.0));
    }

    #[test]
    fn test_targeted_paste_centers_union() {
        let bundle = Bundle::from_boxes(&boxes()).unwrap();
        let mut tracker = PasteTracker::default();
        tracker.reset(bundle.len());
        tracker.record_target(Point::new(500.0, 500.0));

        let placed = tracker.next_placements(&bundle, 10.0);
        // Union is 140x90, so its top-left lands at (430, 455).
        assert_eq!(placed[0], Rect::new(430.0, 455.0, 50.0, 50.0));
        assert_eq!(placed[1], Rect::new(530.0, 505.0, 40.0, 40.0));
        assert_eq!(tracker.target, None);

        let next = tracker.next_placements(&bundle, 10.0);
        assert_eq!(next[0], Rect::new(440.0, 465.0, 50.0, 50.0));
    }
}
