use anyhow::Result;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::cloudinary::ImageHost;
use crate::collection_store::{CardDraft, CardUpdate, CollectionStore, DEFAULT_CARD_TYPE};

use super::error::ServerError;
use super::http_layers::{log_requests, override_method};
use super::search::search_cards;
use super::session::{
    AuthContext, OwnerSession, AUTH_COOKIE_MAX_AGE_SECS, AUTH_COOKIE_NAME, AUTH_COOKIE_VALUE,
};
use super::state::{GuardedCollectionStore, ServerState};
use super::views;
use super::ServerConfig;

/// Uploads are buffered fully in memory; this bounds the request body.
const MAX_UPLOAD_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Deserialize, Debug)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Deserialize, Debug)]
struct ListNameForm {
    #[serde(default)]
    name: String,
}

/// Redirect to the page the request came from, or home.
fn redirect_back(headers: &HeaderMap) -> Redirect {
    let target = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("/");
    Redirect::to(target)
}

fn auth_cookie(value: &str, max_age: time::Duration) -> String {
    Cookie::build((AUTH_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
        .to_string()
}

async fn home(
    auth: AuthContext,
    State(store): State<GuardedCollectionStore>,
) -> Result<Html<String>, ServerError> {
    let lists = store.get_lists_with_counts()?;
    Ok(Html(views::home_page(&lists, auth.authed)))
}

async fn get_login(auth: AuthContext) -> Response {
    if auth.authed {
        Redirect::to("/").into_response()
    } else {
        Html(views::login_page(None)).into_response()
    }
}

async fn post_login(
    State(config): State<ServerConfig>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    // An empty configured secret never authenticates.
    if !config.owner_password.is_empty() && form.password == config.owner_password {
        let cookie = auth_cookie(
            AUTH_COOKIE_VALUE,
            time::Duration::seconds(AUTH_COOKIE_MAX_AGE_SECS),
        );
        ([(header::SET_COOKIE, cookie)], redirect_back(&headers)).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Html(views::login_page(Some("Invalid password"))),
        )
            .into_response()
    }
}

async fn post_logout(headers: HeaderMap) -> Response {
    let cookie = auth_cookie("", time::Duration::ZERO);
    ([(header::SET_COOKIE, cookie)], redirect_back(&headers)).into_response()
}

async fn post_lists(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Form(form): Form<ListNameForm>,
) -> Result<Redirect, ServerError> {
    let name = form.name.trim();
    // A blank name is a silent no-op; list creation never fails visibly.
    if !name.is_empty() {
        store.create_list(name)?;
    }
    Ok(Redirect::to("/"))
}

async fn get_list(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ServerError> {
    let list = store.get_list(id)?.ok_or_else(|| ServerError::not_found("List"))?;
    let cards = store.get_list_cards(id)?;
    Ok(Html(views::list_page(&list, &cards, true, true)))
}

async fn get_list_view(
    auth: AuthContext,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ServerError> {
    let list = store.get_list(id)?.ok_or_else(|| ServerError::not_found("List"))?;
    let cards = store.get_list_cards(id)?;
    Ok(Html(views::list_page(&list, &cards, false, auth.authed)))
}

async fn post_rename_list(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
    Form(form): Form<ListNameForm>,
) -> Result<Redirect, ServerError> {
    let name = form.name.trim();
    if !name.is_empty() {
        store.rename_list(id, name)?;
    }
    Ok(Redirect::to(&format!("/list/{}", id)))
}

async fn get_card(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ServerError> {
    let card = store.get_card(id)?.ok_or_else(|| ServerError::not_found("Card"))?;
    Ok(Html(views::card_page(&card, true, true)))
}

async fn get_card_view(
    auth: AuthContext,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ServerError> {
    let card = store.get_card(id)?.ok_or_else(|| ServerError::not_found("Card"))?;
    Ok(Html(views::card_page(&card, false, auth.authed)))
}

/// Multipart card form as submitted by the create and edit pages.
#[derive(Debug, Default)]
struct CardFormFields {
    name: String,
    card_number: Option<i64>,
    collection_total: Option<i64>,
    language: Option<String>,
    condition: Option<String>,
    grading_note: Option<i64>,
    owned: bool,
    card_type: Option<String>,
    photo: Option<Vec<u8>>,
}

fn parse_optional_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

fn non_empty(raw: String) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

async fn read_card_form(mut multipart: Multipart) -> Result<CardFormFields, ServerError> {
    let mut form = CardFormFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Validation(format!("Malformed form body: {}", err)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "photo" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::Validation(format!("Broken upload: {}", err)))?;
                // Browsers submit an empty part when no file was chosen.
                if !data.is_empty() {
                    form.photo = Some(data.to_vec());
                }
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ServerError::Validation(format!("Malformed form body: {}", err)))?;
                match field_name.as_str() {
                    "name" => form.name = text,
                    "card_number" => form.card_number = parse_optional_int(&text),
                    "collection_total" => form.collection_total = parse_optional_int(&text),
                    "language" => form.language = non_empty(text),
                    "condition" => form.condition = non_empty(text),
                    "grading_note" => form.grading_note = parse_optional_int(&text),
                    "owned" => form.owned = text == "on",
                    "card_type" => form.card_type = non_empty(text),
                    _ => {}
                }
            }
        }
    }
    Ok(form)
}

async fn post_list_cards(
    _session: OwnerSession,
    State(state): State<ServerState>,
    Path(list_id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, ServerError> {
    let form = read_card_form(multipart).await?;
    let photo = match (&form.name, form.photo) {
        (name, Some(photo)) if !name.trim().is_empty() => photo,
        _ => {
            return Err(ServerError::Validation(
                "Name and image are required".to_string(),
            ))
        }
    };

    // Upload first, then a single INSERT. There is no compensation: a
    // failed insert leaves the uploaded image orphaned on the host.
    let uploaded = state.image_host.upload_image(photo).await?;
    let draft = CardDraft {
        name: form.name,
        photo_url: uploaded.secure_url.clone(),
        card_number: form.card_number,
        collection_total: form.collection_total,
        language: form.language,
        condition: form.condition,
        grading_note: form.grading_note,
        owned: form.owned,
        card_type: form
            .card_type
            .unwrap_or_else(|| DEFAULT_CARD_TYPE.to_string()),
    };
    if let Err(err) = state.store.create_card(list_id, &draft) {
        warn!("Card insert failed, image orphaned at {}", uploaded.secure_url);
        return Err(err.into());
    }
    Ok(Redirect::to(&format!("/list/{}", list_id)))
}

async fn post_card(
    _session: OwnerSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, ServerError> {
    let form = read_card_form(multipart).await?;
    let photo_url = match form.photo {
        Some(photo) => Some(state.image_host.upload_image(photo).await?.secure_url),
        None => None,
    };
    let update = CardUpdate {
        name: form.name,
        card_number: form.card_number,
        collection_total: form.collection_total,
        language: form.language,
        condition: form.condition,
        grading_note: form.grading_note,
        owned: form.owned,
        card_type: form.card_type,
        photo_url,
    };
    state.store.update_card(id, &update)?;
    Ok(Redirect::to(&format!("/card/{}", id)))
}

async fn post_card_toggle(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Redirect, ServerError> {
    store.toggle_owned(id)?;
    Ok(Redirect::to(&format!("/card/{}", id)))
}

async fn delete_card(
    _session: OwnerSession,
    State(store): State<GuardedCollectionStore>,
    Path(id): Path<i64>,
) -> Result<Redirect, ServerError> {
    // Deleting an unknown id is not an error; it just goes home.
    match store.delete_card(id)? {
        Some(list_id) => Ok(Redirect::to(&format!("/list/{}", list_id))),
        None => Ok(Redirect::to("/")),
    }
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn CollectionStore>,
    image_host: Arc<dyn ImageHost>,
) -> Result<Router> {
    let state = ServerState::new(config, store, image_host);

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/login", get(get_login).post(post_login))
        .route("/logout", post(post_logout))
        .route("/lists", post(post_lists))
        .route("/list/{id}", get(get_list))
        .route("/list/{id}/view", get(get_list_view))
        .route("/list/{id}/rename", post(post_rename_list))
        .route("/list/{id}/cards", post(post_list_cards))
        .route(
            "/card/{id}",
            get(get_card).post(post_card).delete(delete_card),
        )
        .route("/card/{id}/view", get(get_card_view))
        .route("/card/{id}/toggle", post(post_card_toggle))
        .route("/search", get(search_cards))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .with_state(state.clone());

    if let Some(static_dir_path) = &state.config.static_dir_path {
        app = app.nest_service("/static", ServeDir::new(static_dir_path));
    }

    app = app.layer(middleware::from_fn(override_method));
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn CollectionStore>,
    image_host: Arc<dyn ImageHost>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store, image_host)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudinary::UploadedImage;
    use crate::collection_store::SqliteCollectionStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct StaticImageHost;

    #[async_trait]
    impl ImageHost for StaticImageHost {
        async fn upload_image(&self, _bytes: Vec<u8>) -> Result<UploadedImage> {
            Ok(UploadedImage {
                secure_url: "https://res.cloudinary.com/demo/image/upload/v1/t.jpg".to_string(),
            })
        }
    }

    fn test_config() -> ServerConfig {
        ServerConfig {
            owner_password: "hunter2".to_string(),
            ..Default::default()
        }
    }

    fn test_app(config: ServerConfig) -> Router {
        let store = Arc::new(SqliteCollectionStore::open_in_memory().unwrap());
        make_app(config, store, Arc::new(StaticImageHost)).unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn unauthenticated_detail_routes_downgrade_to_views() {
        let app = test_app(test_config());

        for (path, target) in [("/list/42", "/list/42/view"), ("/card/7", "/card/7/view")] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert!(response.status().is_redirection(), "path {:?}", path);
            assert_eq!(location(&response), target);
        }
    }

    #[tokio::test]
    async fn unauthenticated_mutations_redirect_to_login() {
        let app = test_app(test_config());

        for (method, path) in [
            ("POST", "/lists"),
            ("POST", "/list/42/cards"),
            ("POST", "/list/42/rename"),
            ("POST", "/card/7"),
            ("POST", "/card/7/toggle"),
            ("DELETE", "/card/7"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert!(
                response.status().is_redirection(),
                "{} {} -> {}",
                method,
                path,
                response.status()
            );
            assert_eq!(location(&response), "/login", "{} {}", method, path);
        }
    }

    #[tokio::test]
    async fn view_routes_render_404_for_unknown_ids_without_redirect() {
        let app = test_app(test_config());

        for path in ["/list/42/view", "/card/7/view"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {:?}", path);
        }
    }

    #[tokio::test]
    async fn home_and_search_are_public() {
        let app = test_app(test_config());

        for path in ["/", "/search", "/login"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "path {:?}", path);
        }
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_with_401() {
        let app = test_app(test_config());

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("password=wrong"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_sets_cookie_and_redirects_back() {
        let app = test_app(test_config());

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::REFERER, "/list/3")
            .body(Body::from("password=hunter2"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/list/3");

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(set_cookie.starts_with("auth=1"));
        assert!(set_cookie.contains("Max-Age=2592000"));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn empty_configured_password_never_authenticates() {
        let app = test_app(ServerConfig::default());

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("password="))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_list_detail_renders_404_for_unknown_id() {
        let app = test_app(test_config());

        let request = Request::builder()
            .uri("/list/42")
            .header(header::COOKIE, "auth=1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_of_unknown_card_redirects_home() {
        let app = test_app(test_config());

        let request = Request::builder()
            .method("DELETE")
            .uri("/card/999")
            .header(header::COOKIE, "auth=1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn form_post_with_method_override_deletes() {
        let app = test_app(test_config());

        let request = Request::builder()
            .method("POST")
            .uri("/card/999?_method=DELETE")
            .header(header::COOKIE, "auth=1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/");
    }
}
