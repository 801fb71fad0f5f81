//! Cookie-based owner session.
//!
//! Authentication is a single shared "owner mode" toggle carried by the
//! `auth=1` cookie. [`AuthContext`] is the per-request capability every
//! handler can ask for; [`OwnerSession`] is the gate on write routes,
//! whose rejection downgrades to the read-only view when one exists.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::Redirect,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::convert::Infallible;

use super::state::ServerState;

pub const AUTH_COOKIE_NAME: &str = "auth";
pub const AUTH_COOKIE_VALUE: &str = "1";
/// 30 days.
pub const AUTH_COOKIE_MAX_AGE_SECS: i64 = 2_592_000;

lazy_static! {
    static ref LIST_DETAIL_PATH: Regex = Regex::new(r"^/list/(\d+)$").unwrap();
    static ref CARD_DETAIL_PATH: Regex = Regex::new(r"^/card/(\d+)$").unwrap();
}

/// Parse a Cookie header into key/value pairs: split on `;`, trim, split
/// each pair on the first `=`, URL-decode both sides. A pair without `=`
/// is a key with an empty value. Later duplicates win.
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (url_decode(key), url_decode(value)),
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

fn url_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn is_authenticated(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(parse_cookie_header)
        .and_then(|cookies| cookies.get(AUTH_COOKIE_NAME).cloned())
        .is_some_and(|value| value == AUTH_COOKIE_VALUE)
}

/// Per-request authentication state, constructed once from the parsed
/// cookie header and passed to handlers as an explicit capability.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub authed: bool,
}

impl FromRequestParts<ServerState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthContext {
            authed: is_authenticated(parts),
        })
    }
}

/// Proof of owner mode. Extraction fails with a redirect instead of an
/// error page: detail routes downgrade to their public view, everything
/// else goes to the login form.
pub struct OwnerSession;

/// Where an unauthenticated request to `path` gets redirected.
pub fn downgrade_target(path: &str) -> String {
    if let Some(captures) = LIST_DETAIL_PATH.captures(path) {
        return format!("/list/{}/view", &captures[1]);
    }
    if let Some(captures) = CARD_DETAIL_PATH.captures(path) {
        return format!("/card/{}/view", &captures[1]);
    }
    "/login".to_string()
}

impl FromRequestParts<ServerState> for OwnerSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if is_authenticated(parts) {
            Ok(OwnerSession)
        } else {
            Err(Redirect::to(&downgrade_target(parts.uri.path())))
        }
    }
}
