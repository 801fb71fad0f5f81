//! Data models for the card collection.

use serde::{Deserialize, Serialize};

/// Languages offered by the card forms. The store accepts arbitrary
/// strings; these are UI suggestions only.
pub const LANGUAGES: &[&str] = &[
    "Portuguese",
    "English",
    "Japanese",
    "Italian",
    "Spanish",
    "German",
    "French",
    "Simplified Chinese",
    "Traditional Chinese",
    "Korean",
];

/// Card condition grades, best to worst.
pub const CONDITIONS: &[&str] = &["GM", "M", "NM", "SP", "MP", "HP", "D"];

/// Card printing/finish variants. "Normal" is the creation default.
pub const CARD_TYPES: &[&str] = &[
    "Normal",
    "Foil",
    "Reverse Foil",
    "Signed",
    "Promo",
    "Textless",
    "Altered",
    "Pre Release",
    "Edition One",
    "Shadowless",
    "Staff",
    "Misprint",
    "Shattered Holo",
    "Master Ball",
    "Poke Ball",
];

pub const DEFAULT_CARD_TYPE: &str = "Normal";

#[derive(Debug, Clone, Serialize)]
pub struct List {
    pub id: i64,
    pub name: String,
}

/// A list row joined with its card count, as shown on the home page.
#[derive(Debug, Clone, Serialize)]
pub struct ListWithCount {
    pub id: i64,
    pub name: String,
    pub card_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub photo_url: String,
    pub card_number: Option<i64>,
    pub collection_total: Option<i64>,
    pub language: Option<String>,
    pub card_order: i64,
    pub grading_note: Option<i64>,
    pub condition: Option<String>,
    /// Read through COALESCE(owned, 0); a never-set card reads as false.
    pub owned: bool,
    /// Read through COALESCE(card_type, 'Normal').
    pub card_type: String,
}

/// A card joined with its owning list, for detail and search pages.
#[derive(Debug, Clone, Serialize)]
pub struct CardWithList {
    pub card: Card,
    pub list_id: i64,
    pub list_name: String,
}

/// Field values for a new card. `photo_url` is mandatory: card creation
/// requires a successful image upload first.
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub name: String,
    pub photo_url: String,
    pub card_number: Option<i64>,
    pub collection_total: Option<i64>,
    pub language: Option<String>,
    pub condition: Option<String>,
    pub grading_note: Option<i64>,
    pub owned: bool,
    pub card_type: String,
}

/// Field values for a card update. `photo_url` is only set when a new
/// image was uploaded; `None` preserves the stored value.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub name: String,
    pub card_number: Option<i64>,
    pub collection_total: Option<i64>,
    pub language: Option<String>,
    pub condition: Option<String>,
    pub grading_note: Option<i64>,
    pub owned: bool,
    pub card_type: Option<String>,
    pub photo_url: Option<String>,
}

/// Raw search parameters as they arrive on the query string. Each field
/// is interpreted by the query builder; unparseable values disable the
/// corresponding filter rather than erroring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub owned: Option<String>,
    #[serde(default)]
    pub grading_min: Option<String>,
    #[serde(default)]
    pub grading_max: Option<String>,
}
