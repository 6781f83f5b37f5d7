// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The shared class-name list.
//!
//! Every box refers to its class by index into one ordered list owned
//! outside the editing core. Cloning a [`ClassList`] clones the handle,
//! not the names, so all holders observe the same list.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct ClassList {
    names: Rc<RefCell<Vec<String>>>,
}

impl ClassList {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names: Rc::new(RefCell::new(names)),
        }
    }

    /// Position of `name` in the list.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.borrow().iter().position(|n| n == name)
    }

    /// Name at `index`, or `None` if the index is stale.
    pub fn name(&self, index: usize) -> Option<String> {
        self.names.borrow().get(index).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.names.borrow().len()
    }

    /// Snapshot of the current names.
    pub fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }

    /// Append a class and return its index. Existing names are not duplicated.
    pub fn push(&self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(index) = self.index_of(&name) {
            return index;
        }
        let mut names = self.names.borrow_mut();
        names.push(name);
        names.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_names() {
        let classes = ClassList::new(vec!["car".into()]);
        let view = classes.clone();
        classes.push("person");
        assert_eq!(view.index_of("person"), Some(1));
        assert_eq!(view.name(0).as_deref(), Some("car"));
    }

    #[test]
    fn test_push_existing_returns_index() {
        let classes = ClassList::new(vec!["car".into(), "bus".into()]);
        assert_eq!(classes.push("bus"), 1);
        assert_eq!(classes.len(), 2);
    }

    #[test]
    fn test_stale_index_has_no_name() {
        let classes = ClassList::new(vec!["car".into()]);
        assert_eq!(classes.name(3), None);
    }
}
