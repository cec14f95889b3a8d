//! Pagination state and the item arena it accumulates into.

use std::collections::HashMap;
use std::sync::Arc;

use super::factory::{DisplayItem, ItemId};

/// Ordered, append-only collection of display items addressed by id.
///
/// Storage is shared copy-on-write with the snapshots handed to subscribers,
/// so publishing a snapshot never copies items that did not change.
#[derive(Debug, Clone, Default)]
pub struct ItemArena {
    items: Arc<Vec<DisplayItem>>,
    index: HashMap<ItemId, usize>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: DisplayItem) {
        let position = self.items.len();
        self.index.insert(item.id, position);
        Arc::make_mut(&mut self.items).push(item);
    }

    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = DisplayItem>,
    {
        for item in items {
            self.push(item);
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&DisplayItem> {
        self.index.get(&id).map(|&position| &self.items[position])
    }

    pub fn at(&self, position: usize) -> Option<&DisplayItem> {
        self.items.get(position)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Replace the item stored under `item.id`.
    ///
    /// Returns false when the id is unknown; the arena is left untouched.
    pub fn replace(&mut self, item: DisplayItem) -> bool {
        match self.index.get(&item.id) {
            Some(&position) => {
                Arc::make_mut(&mut self.items)[position] = item;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter()
    }

    pub fn shared(&self) -> Arc<Vec<DisplayItem>> {
        Arc::clone(&self.items)
    }

    pub fn clear(&mut self) {
        self.items = Arc::new(Vec::new());
        self.index.clear();
    }
}

/// Coarse state of the pagination state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No fetch in flight and more pages may exist
    Idle,
    /// Exactly one fetch is outstanding
    Fetching,
    /// The last page has been applied; no further fetches
    Exhausted,
}

/// Mutable state owned by the controller.
#[derive(Debug, Clone)]
pub struct PaginationState {
    items: ItemArena,
    offset: usize,
    page_size: usize,
    has_more: bool,
    is_fetching: bool,
    last_error: Option<String>,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: ItemArena::new(),
            offset: 0,
            page_size,
            has_more: true,
            is_fetching: false,
            last_error: None,
        }
    }

    pub fn items(&self) -> &ItemArena {
        &self.items
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> FeedPhase {
        if self.is_fetching {
            FeedPhase::Fetching
        } else if self.has_more {
            FeedPhase::Idle
        } else {
            FeedPhase::Exhausted
        }
    }

    /// Loaded items plus the trailing summary slot
    pub fn item_count(&self) -> usize {
        self.items.len() + 1
    }

    /// Admit a fetch if the state allows one.
    ///
    /// Returns the offset to fetch from and marks the state as fetching, or
    /// `None` when a fetch is already outstanding or the feed is exhausted.
    pub fn begin_fetch(&mut self) -> Option<usize> {
        if self.phase() != FeedPhase::Idle {
            return None;
        }
        self.is_fetching = true;
        Some(self.offset)
    }

    /// Apply a successfully decoded page.
    pub fn apply_page(&mut self, items: Vec<DisplayItem>, total_count: usize) {
        self.items.extend(items);
        self.offset += self.page_size;
        self.has_more = self.offset < total_count;
        self.is_fetching = false;
        self.last_error = None;
    }

    /// Abandon the outstanding fetch; offset, items and `has_more` stay as they were.
    pub fn fail_fetch(&mut self, error: impl Into<String>) {
        self.is_fetching = false;
        self.last_error = Some(error.into());
    }

    /// Show the full text of an item. Returns false for unknown ids.
    pub fn expand(&mut self, id: ItemId) -> bool {
        let Some(item) = self.items.get(id) else {
            return false;
        };
        let expanded = item.expanded();
        self.items.replace(expanded)
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.offset = 0;
        self.has_more = true;
        self.is_fetching = false;
        self.last_error = None;
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            items: self.items.shared(),
            offset: self.offset,
            has_more: self.has_more,
            is_fetching: self.is_fetching,
            phase: self.phase(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Immutable view of the pagination state handed to subscribers.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub items: Arc<Vec<DisplayItem>>,
    pub offset: usize,
    pub has_more: bool,
    pub is_fetching: bool,
    pub phase: FeedPhase,
    /// Message of the most recent failed fetch, cleared by the next applied page
    pub last_error: Option<String>,
}

impl StateSnapshot {
    pub fn item_count(&self) -> usize {
        self.items.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::decoder::ReviewRecord;
    use crate::reviews::factory::ItemFactory;

    fn items(count: usize) -> Vec<DisplayItem> {
        let factory = ItemFactory::new();
        (0..count)
            .map(|i| {
                factory.to_display_item(ReviewRecord {
                    text: format!("text {}", i),
                    created_at: "today".to_string(),
                    first_name: "First".to_string(),
                    last_name: format!("Last{}", i),
                    rating: 5,
                })
            })
            .collect()
    }

    #[test]
    fn test_arena_lookup_and_replace() {
        let mut arena = ItemArena::new();
        let batch = items(3);
        let second = batch[1].id;
        arena.extend(batch);

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.position(second), Some(1));

        let expanded = arena.get(second).unwrap().expanded();
        assert!(arena.replace(expanded));
        assert!(!arena.at(1).unwrap().truncated);
        assert!(arena.at(0).unwrap().truncated);

        let stranger = items(1).remove(0);
        assert!(!arena.replace(stranger));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_mutation() {
        let mut state = PaginationState::new(2);
        state.begin_fetch();
        let batch = items(2);
        let first = batch[0].id;
        state.apply_page(batch, 10);

        let before = state.snapshot();
        state.expand(first);
        state.begin_fetch();
        state.apply_page(items(2), 10);

        assert_eq!(before.items.len(), 2);
        assert!(before.items[0].truncated);
        assert_eq!(state.snapshot().items.len(), 4);
        assert!(!state.snapshot().items[0].truncated);
    }

    #[test]
    fn test_begin_fetch_admits_once() {
        let mut state = PaginationState::new(20);
        assert_eq!(state.begin_fetch(), Some(0));
        assert_eq!(state.begin_fetch(), None);
        assert_eq!(state.phase(), FeedPhase::Fetching);
    }

    #[test]
    fn test_failure_keeps_progress() {
        let mut state = PaginationState::new(20);
        state.begin_fetch();
        state.apply_page(items(20), 45);
        state.begin_fetch();
        state.fail_fetch("boom");

        assert_eq!(state.offset(), 20);
        assert_eq!(state.items().len(), 20);
        assert!(state.has_more());
        assert!(!state.is_fetching());
        assert_eq!(state.last_error(), Some("boom"));
        assert_eq!(state.begin_fetch(), Some(20));
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let mut state = PaginationState::new(20);
        state.begin_fetch();
        state.apply_page(items(5), 5);

        assert_eq!(state.phase(), FeedPhase::Exhausted);
        assert_eq!(state.begin_fetch(), None);
        assert_eq!(state.item_count(), 6);

        state.reset();
        assert_eq!(state.phase(), FeedPhase::Idle);
        assert_eq!(state.item_count(), 1);
        assert_eq!(state.begin_fetch(), Some(0));
    }
}
