//! Ordered annotation list with its transient references
//!
//! The list itself is never mutated in place: every change builds the next
//! list and swaps it in. Snapshots handed to the export pipeline therefore
//! stay valid while the user keeps drawing.

use std::sync::Arc;

use crate::domain::{Annotation, AnnotationId, LogicalRect, Point};

#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Arc<Vec<Annotation>>,
    next_id: u64,
    /// Shape being drawn, not yet part of the list
    pub draft: Option<Annotation>,
    /// Target of Delete
    pub selected: Option<AnnotationId>,
    /// Text annotation with an open edit session
    pub editing: Option<AnnotationId>,
}

impl AnnotationStore {
    /// Committed annotations in paint order
    pub fn list(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Shared handle to the current list
    pub fn snapshot(&self) -> Arc<Vec<Annotation>> {
        Arc::clone(&self.annotations)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Hand out a fresh id; ids are never reused within a store
    pub fn allocate_id(&mut self) -> AnnotationId {
        self.next_id += 1;
        AnnotationId(self.next_id)
    }

    fn commit(&mut self, next: Vec<Annotation>) {
        self.annotations = Arc::new(next);
    }

    /// Append to the end of the list
    pub fn append(&mut self, annotation: Annotation) {
        debug_assert!(self.get(annotation.id).is_none(), "duplicate annotation id");
        let mut next = Vec::with_capacity(self.annotations.len() + 1);
        next.extend(self.annotations.iter().cloned());
        next.push(annotation);
        self.commit(next);
    }

    /// Replace the entry with the same id; returns false if it no longer exists
    pub fn replace(&mut self, updated: Annotation) -> bool {
        if self.get(updated.id).is_none() {
            return false;
        }
        let next = self
            .annotations
            .iter()
            .map(|a| if a.id == updated.id { updated.clone() } else { a.clone() })
            .collect();
        self.commit(next);
        true
    }

    /// Remove an annotation, clearing any reference to it
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.get(id).cloned()?;
        let next = self
            .annotations
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        self.commit(next);
        self.forget(id);
        Some(removed)
    }

    /// Pop the most recently appended annotation
    pub fn undo(&mut self) -> Option<Annotation> {
        let last = self.annotations.last().cloned()?;
        let next = self.annotations[..self.annotations.len() - 1].to_vec();
        self.commit(next);
        self.forget(last.id);
        Some(last)
    }

    fn forget(&mut self, id: AnnotationId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
    }

    /// Topmost annotation under `p`, seen through the `clip` region
    ///
    /// Annotations only show inside the selection, so nothing is hit outside
    /// it or when there is no selection.
    pub fn hit_test(&self, p: Point, clip: LogicalRect) -> Option<&Annotation> {
        if clip.is_empty() || !clip.contains(p) {
            return None;
        }
        self.annotations.iter().rev().find(|a| a.hit_test(p))
    }

    /// Drop every annotation and reference
    pub fn clear(&mut self) {
        self.commit(Vec::new());
        self.draft = None;
        self.selected = None;
        self.editing = None;
    }
}
