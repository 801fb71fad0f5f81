//! Public card search route.

use axum::{
    extract::{Query, State},
    response::Html,
};

use crate::collection_store::SearchFilters;

use super::error::ServerError;
use super::session::AuthContext;
use super::state::GuardedCollectionStore;
use super::views;

/// GET /search: filterable, public, capped at 500 rows by the store.
pub async fn search_cards(
    auth: AuthContext,
    State(store): State<GuardedCollectionStore>,
    Query(filters): Query<SearchFilters>,
) -> Result<Html<String>, ServerError> {
    let results = store.search_cards(&filters)?;
    Ok(Html(views::search_page(&results, &filters, auth.authed)))
}
