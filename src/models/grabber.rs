// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Resize handle ("grabber") geometry.
//!
//! A selected box shows eight square handles centered on its corners
//! and edge midpoints. This module computes their regions, decides
//! which handle (or the body) a point hits, and maps each handle to a
//! resize cursor.

use crate::util::geometry::{Point, Rect};

/// Default handle edge length in screen pixels.
pub const DEFAULT_HANDLE_SIZE: f64 = 8.0;

/// The eight handles, listed clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleId {
    TopLeft,
    TopCenter,
    TopRight,
    RightCenter,
    BottomRight,
    BottomCenter,
    BottomLeft,
    LeftCenter,
}

impl HandleId {
    /// Clockwise from top-left.
    pub const ALL: [HandleId; 8] = [
        HandleId::TopLeft,
        HandleId::TopCenter,
        HandleId::TopRight,
        HandleId::RightCenter,
        HandleId::BottomRight,
        HandleId::BottomCenter,
        HandleId::BottomLeft,
        HandleId::LeftCenter,
    ];

    /// Hit-test order: corners first, then edges, each clockwise.
    pub const PRIORITY: [HandleId; 8] = [
        HandleId::TopLeft,
        HandleId::TopRight,
        HandleId::BottomRight,
        HandleId::BottomLeft,
        HandleId::TopCenter,
        HandleId::RightCenter,
        HandleId::BottomCenter,
        HandleId::LeftCenter,
    ];

    /// Where this handle sits on `rect`.
    pub fn anchor(self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            HandleId::TopLeft => Point::new(rect.left(), rect.top()),
            HandleId::TopCenter => Point::new(c.x, rect.top()),
            HandleId::TopRight => Point::new(rect.right(), rect.top()),
            HandleId::RightCenter => Point::new(rect.right(), c.y),
            HandleId::BottomRight => Point::new(rect.right(), rect.bottom()),
            HandleId::BottomCenter => Point::new(c.x, rect.bottom()),
            HandleId::BottomLeft => Point::new(rect.left(), rect.bottom()),
            HandleId::LeftCenter => Point::new(rect.left(), c.y),
        }
    }

    pub fn moves_left(self) -> bool {
        matches!(self, HandleId::TopLeft | HandleId::LeftCenter | HandleId::BottomLeft)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, HandleId::TopRight | HandleId::RightCenter | HandleId::BottomRight)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, HandleId::TopLeft | HandleId::TopCenter | HandleId::TopRight)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, HandleId::BottomLeft | HandleId::BottomCenter | HandleId::BottomRight)
    }

    /// Move the edges this handle controls to `pos`, leaving the others
    /// where they are in `original`. Dragging past the opposite edge
    /// swaps the edges so the result keeps a non-negative size.
    pub fn drag(self, original: &Rect, pos: Point) -> Rect {
        let left = if self.moves_left() { pos.x } else { original.left() };
        let right = if self.moves_right() { pos.x } else { original.right() };
        let top = if self.moves_top() { pos.y } else { original.top() };
        let bottom = if self.moves_bottom() { pos.y } else { original.bottom() };
        Rect::from_edges(left, top, right, bottom)
    }
}

/// What a point hit on a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Handle(HandleId),
    Body,
}

/// Square region of `size` centered on `handle`'s anchor.
pub fn handle_region(rect: &Rect, handle: HandleId, size: f64) -> Rect {
    let anchor = handle.anchor(rect);
    Rect::new(anchor.x - size / 2.0, anchor.y - size / 2.0, size, size)
}

/// All eight handle regions, clockwise from top-left.
pub fn handle_regions(rect: &Rect, size: f64) -> [(HandleId, Rect); 8] {
    HandleId::ALL.map(|h| (h, handle_region(rect, h, size)))
}

/// Classify `point` against `rect` and its handles.
///
/// Handles are tested in [`HandleId::PRIORITY`] order and the first match
/// wins, so overlapping handles on tiny boxes resolve the same way every
/// time.
pub fn classify(rect: &Rect, point: Point, handle_size: f64) -> Option<Hit> {
    HandleId::PRIORITY
        .iter()
        .find(|h| handle_region(rect, **h, handle_size).contains(point))
        .map(|h| Hit::Handle(*h))
        .or_else(|| rect.contains(point).then_some(Hit::Body))
}

/// Pointer cursor shapes the editor asks the host to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Default,
    Crosshair,
    Move,
    Grab,
    ResizeNwSe,
    ResizeNeSw,
    ResizeVertical,
    ResizeHorizontal,
}

/// Resize cursor orientation for a handle.
pub fn cursor_for(handle: HandleId) -> CursorShape {
    match handle {
        HandleId::TopLeft | HandleId::BottomRight => CursorShape::ResizeNwSe,
        HandleId::TopRight | HandleId::BottomLeft => CursorShape::ResizeNeSw,
        HandleId::TopCenter | HandleId::BottomCenter => CursorShape::ResizeVertical,
        HandleId::RightCenter | HandleId::LeftCenter => CursorShape::ResizeHorizontal,
    }
}
