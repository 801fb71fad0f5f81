//! Trait definition for the collection data layer.

use anyhow::Result;

use super::models::{Card, CardDraft, CardUpdate, CardWithList, List, ListWithCount, SearchFilters};

/// Data access for lists and cards.
///
/// Implementations execute exactly one statement per call and release
/// their connection on every path, success or failure.
pub trait CollectionStore: Send + Sync {
    /// All lists with their card counts, ordered by name.
    fn get_lists_with_counts(&self) -> Result<Vec<ListWithCount>>;

    /// Insert a list and return its id. The caller is responsible for
    /// trimming and blank-name checks.
    fn create_list(&self, name: &str) -> Result<i64>;

    /// Update a list's name. Unknown ids are a no-op.
    fn rename_list(&self, id: i64, name: &str) -> Result<()>;

    fn get_list(&self, id: i64) -> Result<Option<List>>;

    /// Cards of a list ordered by their display position.
    fn get_list_cards(&self, list_id: i64) -> Result<Vec<Card>>;

    fn get_card(&self, id: i64) -> Result<Option<CardWithList>>;

    /// Insert a card. The display position is computed inside the INSERT
    /// as max(card_order in the list) + 1, so no second round trip exists
    /// to race against.
    fn create_card(&self, list_id: i64, draft: &CardDraft) -> Result<i64>;

    fn update_card(&self, id: i64, update: &CardUpdate) -> Result<()>;

    /// Flip the owned flag, treating NULL as false before negating.
    fn toggle_owned(&self, id: i64) -> Result<()>;

    /// Delete a card and return the id of the list it belonged to, or
    /// None when no such card existed.
    fn delete_card(&self, id: i64) -> Result<Option<i64>>;

    /// Filtered search across all cards, at most 500 rows, ordered by
    /// list name, card position, card name.
    fn search_cards(&self, filters: &SearchFilters) -> Result<Vec<CardWithList>>;
}
