//! At-most-once rendering of server-confirmed entities.
//!
//! The server may redeliver a response, or two requests may race; whatever
//! arrives, a given entity id is rendered into the list exactly once.
//! `RenderedIds` lives inside the page state and is dropped wholesale on
//! navigation, so there is no process-global set to reset.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::CommentId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedIds {
    ids: HashSet<CommentId>,
}

impl RenderedIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the entities the server already rendered into the page.
    #[must_use]
    pub fn seeded(ids: impl IntoIterator<Item = CommentId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Mark an id as rendered. Returns `true` if the id was fresh. The id
    /// is inserted before the caller touches the list, closing the race
    /// window between membership check and insertion.
    pub fn try_mark(&mut self, id: CommentId) -> bool {
        self.ids.insert(id)
    }

    #[must_use]
    pub fn contains(&self, id: CommentId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_fresh_id_once() {
        let mut rendered = RenderedIds::new();
        assert!(rendered.try_mark(CommentId::new(42)));
        assert!(!rendered.try_mark(CommentId::new(42)));
    }

    #[test]
    fn seeded_ids_are_already_marked() {
        let mut rendered = RenderedIds::seeded([CommentId::new(1), CommentId::new(2)]);
        assert!(!rendered.try_mark(CommentId::new(1)));
        assert!(rendered.try_mark(CommentId::new(3)));
        assert_eq!(rendered.len(), 3);
    }

    #[test]
    fn distinct_ids_are_independent() {
        let mut rendered = RenderedIds::new();
        assert!(rendered.try_mark(CommentId::new(1)));
        assert!(rendered.try_mark(CommentId::new(2)));
        assert!(rendered.contains(CommentId::new(1)));
        assert!(rendered.contains(CommentId::new(2)));
    }
}
