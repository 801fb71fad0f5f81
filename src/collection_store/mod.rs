mod models;
mod schema;
mod search;
mod store;
mod trait_def;

pub use models::{
    Card, CardDraft, CardUpdate, CardWithList, List, ListWithCount, SearchFilters, CARD_TYPES,
    CONDITIONS, DEFAULT_CARD_TYPE, LANGUAGES,
};
pub use store::SqliteCollectionStore;
pub use trait_def::CollectionStore;
