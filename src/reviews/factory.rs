//! Mapping from decoded review records to display items.

use std::fmt;
use uuid::Uuid;

use super::decoder::ReviewRecord;

/// Stable identifier of a display item for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UI-ready projection of a review.
///
/// Carries raw strings only; fonts, colors and wrapping belong to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub id: ItemId,
    pub rendered_text: String,
    pub rendered_date: String,
    pub rendered_name: String,
    pub rating: i64,
    /// Whether the text is clipped to the collapsed line count
    pub truncated: bool,
}

impl DisplayItem {
    /// Copy of this item with the full text shown
    pub fn expanded(&self) -> Self {
        Self {
            truncated: false,
            ..self.clone()
        }
    }
}

/// Builds display items from records. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFactory;

impl ItemFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn to_display_item(&self, record: ReviewRecord) -> DisplayItem {
        DisplayItem {
            id: ItemId::new(),
            rendered_name: format!("{} {}", record.first_name, record.last_name),
            rendered_text: record.text,
            rendered_date: record.created_at,
            rating: record.rating,
            truncated: true,
        }
    }

    /// Map a whole page, keeping record order
    pub fn to_display_items(&self, records: Vec<ReviewRecord>) -> Vec<DisplayItem> {
        records
            .into_iter()
            .map(|record| self.to_display_item(record))
            .collect()
    }
}
