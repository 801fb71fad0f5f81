//! SQLite schema for the card collection database.
//!
//! Two tables: lists, and the cards that belong to them. Enumerated
//! fields (language, condition, card_type) are plain TEXT; the UI offers
//! fixed choices but the store does not constrain them.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const LISTS_TABLE: Table = Table {
    name: "lists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

const CARD_LIST_FK: ForeignKey = ForeignKey {
    foreign_table: "lists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const CARDS_TABLE: Table = Table {
    name: "cards",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "list_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CARD_LIST_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("photo_url", &SqlType::Text, non_null = true),
        sqlite_column!("card_number", &SqlType::Integer),
        sqlite_column!("collection_total", &SqlType::Integer),
        sqlite_column!("language", &SqlType::Text),
        // Assigned as max(card_order in list) + 1 at insert time; gaps
        // remain after deletions.
        sqlite_column!("card_order", &SqlType::Integer, non_null = true),
        sqlite_column!("grading_note", &SqlType::Integer),
        sqlite_column!("condition", &SqlType::Text),
        sqlite_column!("owned", &SqlType::Integer),
        sqlite_column!("card_type", &SqlType::Text),
    ],
    indices: &[("idx_cards_list", "list_id")],
};

pub const COLLECTION_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[LISTS_TABLE, CARDS_TABLE],
    migration: None,
}];
