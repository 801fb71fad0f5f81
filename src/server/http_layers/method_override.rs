//! Method override for HTML forms.
//!
//! Browsers only submit GET and POST, so the delete control posts with
//! `?_method=DELETE` and this layer rewrites the method before routing.

use axum::{
    body::Body,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};

pub async fn override_method(mut request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::POST {
        let wants_delete = request
            .uri()
            .query()
            .map(|query| query.split('&').any(|pair| pair == "_method=DELETE"))
            .unwrap_or(false);
        if wants_delete {
            *request.method_mut() = Method::DELETE;
        }
    }
    next.run(request).await
}
