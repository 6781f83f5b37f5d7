// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo history.

use super::command::Command;
use crate::models::annotation::BoxSet;

/// Default number of undoable commands kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Where the edit session sends the commands it produces.
pub trait HistorySink {
    /// Apply `command` to `boxes` and record it.
    fn push(&mut self, command: Command, boxes: &mut BoxSet);

    /// Revert the most recent command. Returns `false` if there was none.
    fn undo(&mut self, boxes: &mut BoxSet) -> bool;

    /// Re-apply the most recently undone command. Returns `false` if there was none.
    fn redo(&mut self, boxes: &mut BoxSet) -> bool;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// Forget everything without replaying.
    fn clear(&mut self);
}

/// Linear undo/redo stacks.
#[derive(Debug)]
pub struct History {
    /// Commands that can be undone, oldest first
    undo_stack: Vec<Command>,
    /// Commands undone since the last push, most recent last
    redo_stack: Vec<Command>,
    /// Maximum history size
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    #[cfg(test)]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}

impl HistorySink for History {
    fn push(&mut self, command: Command, boxes: &mut BoxSet) {
        command.apply(boxes);
        log::debug!("Recorded {} command", command.label());
        self.undo_stack.push(command);
        // Limit history size
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        // A new edit discards the redoable tail
        self.redo_stack.clear();
    }

    fn undo(&mut self, boxes: &mut BoxSet) -> bool {
        match self.undo_stack.pop() {
            Some(command) => {
                command.invert(boxes);
                log::info!("Undo {}", command.label());
                self.redo_stack.push(command);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self, boxes: &mut BoxSet) -> bool {
        match self.redo_stack.pop() {
            Some(command) => {
                command.apply(boxes);
                log::info!("Redo {}", command.label());
                self.undo_stack.push(command);
                true
            }
            None => false,
        }
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
