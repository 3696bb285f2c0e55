//! Order-preserving ID sets backing selection and activation state.

use std::collections::HashSet;

use crate::model::AnnotationId;

/// Insertion-ordered set of annotation IDs with O(1) membership tests.
///
/// Selection order is visible to consumers (the list UI mirrors the order in
/// which annotations were picked), so a bare `HashSet` is not enough; a bare
/// `Vec` would make drag-selection membership tests quadratic.
#[derive(Debug, Clone, Default)]
pub struct IdSet {
    order: Vec<AnnotationId>,
    members: HashSet<AnnotationId>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ID. Returns false if it was already present.
    pub fn insert(&mut self, id: AnnotationId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove an ID. Removing an absent ID is a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|member| member != id);
        true
    }

    /// Flip membership of a single ID.
    pub fn toggle(&mut self, id: AnnotationId) {
        if self.members.contains(&id) {
            self.remove(&id);
        } else {
            self.insert(id);
        }
    }

    /// Replace the whole set, keeping the first occurrence of duplicates.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = AnnotationId>) {
        self.order.clear();
        self.members.clear();
        for id in ids {
            self.insert(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Member IDs in insertion order.
    pub fn ids(&self) -> &[AnnotationId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}
