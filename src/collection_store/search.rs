//! Dynamic filter assembly for the card search.
//!
//! Filters accumulate as (predicate, bound value) pairs and render into
//! positional placeholders at the end. User input is always bound, never
//! spliced into the SQL text.

use rusqlite::types::Value;

use super::models::SearchFilters;

pub const SEARCH_RESULT_LIMIT: usize = 500;

/// Accumulates WHERE predicates with their bound values. Placeholders
/// are numbered in append order; each predicate names its own slot via
/// the `{}` marker.
#[derive(Default)]
pub struct QueryBuilder {
    predicates: Vec<String>,
    params: Vec<Value>,
}

impl QueryBuilder {
    pub fn push(&mut self, predicate: &str, value: Value) {
        self.params.push(value);
        let placeholder = format!("?{}", self.params.len());
        self.predicates.push(predicate.replace("{}", &placeholder));
    }

    pub fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// Interpret the raw query parameters into predicates.
///
/// Every filter is optional and ANDed with the others. The owned filter
/// only engages on the literal strings "true"/"false"; the grading
/// bounds only when the raw value parses as an integer. Anything else
/// leaves the corresponding filter off.
pub fn build_card_filters(filters: &SearchFilters) -> QueryBuilder {
    let mut builder = QueryBuilder::default();

    if let Some(q) = filters.q.as_deref() {
        let q = q.trim();
        if !q.is_empty() {
            builder.push(
                "LOWER(c.name) LIKE LOWER({})",
                Value::Text(format!("%{}%", q)),
            );
        }
    }
    if let Some(condition) = non_empty(filters.condition.as_deref()) {
        builder.push("c.condition = {}", Value::Text(condition.to_string()));
    }
    if let Some(language) = non_empty(filters.language.as_deref()) {
        builder.push("c.language = {}", Value::Text(language.to_string()));
    }
    if let Some(card_type) = non_empty(filters.card_type.as_deref()) {
        builder.push(
            "COALESCE(c.card_type, 'Normal') = {}",
            Value::Text(card_type.to_string()),
        );
    }
    match filters.owned.as_deref() {
        Some("true") => builder.push("COALESCE(c.owned, 0) = {}", Value::Integer(1)),
        Some("false") => builder.push("COALESCE(c.owned, 0) = {}", Value::Integer(0)),
        _ => {}
    }
    if let Some(min) = parse_bound(filters.grading_min.as_deref()) {
        builder.push("COALESCE(c.grading_note, 0) >= {}", Value::Integer(min));
    }
    if let Some(max) = parse_bound(filters.grading_max.as_deref()) {
        builder.push("COALESCE(c.grading_note, 0) <= {}", Value::Integer(max));
    }

    builder
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn parse_bound(value: Option<&str>) -> Option<i64> {
    value.filter(|s| !s.is_empty())?.trim().parse().ok()
}
