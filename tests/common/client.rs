//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with cookie-based session handling. Redirects are NOT
//! followed so tests can assert on Location headers directly.

use reqwest::multipart::{Form, Part};
use reqwest::{redirect, Response};
use std::time::Duration;

use super::constants::*;
use super::fixtures::fake_jpeg;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client already holding the owner-mode cookie.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure
    /// problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(OWNER_PASSWORD).await;
        assert!(
            response.status().is_redirection(),
            "Owner authentication failed: {:?}",
            response.status()
        );

        client
    }

    pub fn location(response: &Response) -> String {
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// POST /login
    pub async fn login(&self, password: &str) -> Response {
        self.client
            .post(format!("{}/login", self.base_url))
            .form(&[("password", password)])
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(format!("{}/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Lists
    // ========================================================================

    /// POST /lists
    pub async fn create_list(&self, name: &str) -> Response {
        self.client
            .post(format!("{}/lists", self.base_url))
            .form(&[("name", name)])
            .send()
            .await
            .expect("Create list request failed")
    }

    /// POST /list/{id}/rename
    pub async fn rename_list(&self, list_id: i64, name: &str) -> Response {
        self.client
            .post(format!("{}/list/{}/rename", self.base_url, list_id))
            .form(&[("name", name)])
            .send()
            .await
            .expect("Rename list request failed")
    }

    // ========================================================================
    // Cards
    // ========================================================================

    fn card_form(fields: &[(&str, &str)], with_photo: bool) -> Form {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        if with_photo {
            form = form.part(
                "photo",
                Part::bytes(fake_jpeg())
                    .file_name("card.jpg")
                    .mime_str("image/jpeg")
                    .expect("Invalid mime type"),
            );
        }
        form
    }

    /// POST /list/{id}/cards with an attached photo.
    pub async fn create_card(&self, list_id: i64, name: &str) -> Response {
        self.create_card_with(list_id, &[("name", name)], true).await
    }

    /// POST /list/{id}/cards with explicit fields and optional photo.
    pub async fn create_card_with(
        &self,
        list_id: i64,
        fields: &[(&str, &str)],
        with_photo: bool,
    ) -> Response {
        self.client
            .post(format!("{}/list/{}/cards", self.base_url, list_id))
            .multipart(Self::card_form(fields, with_photo))
            .send()
            .await
            .expect("Create card request failed")
    }

    /// POST /card/{id} with explicit fields and optional photo.
    pub async fn update_card(
        &self,
        card_id: i64,
        fields: &[(&str, &str)],
        with_photo: bool,
    ) -> Response {
        self.client
            .post(format!("{}/card/{}", self.base_url, card_id))
            .multipart(Self::card_form(fields, with_photo))
            .send()
            .await
            .expect("Update card request failed")
    }

    /// POST /card/{id}/toggle
    pub async fn toggle_card(&self, card_id: i64) -> Response {
        self.client
            .post(format!("{}/card/{}/toggle", self.base_url, card_id))
            .send()
            .await
            .expect("Toggle request failed")
    }

    /// DELETE /card/{id}
    pub async fn delete_card(&self, card_id: i64) -> Response {
        self.client
            .delete(format!("{}/card/{}", self.base_url, card_id))
            .send()
            .await
            .expect("Delete request failed")
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// GET /search?{query}
    pub async fn search(&self, query: &str) -> Response {
        let url = if query.is_empty() {
            format!("{}/search", self.base_url)
        } else {
            format!("{}/search?{}", self.base_url, query)
        };
        self.client
            .get(url)
            .send()
            .await
            .expect("Search request failed")
    }

    /// Asserts a response is a redirect and returns its target.
    pub fn assert_redirect(response: &Response) -> String {
        assert!(
            response.status().is_redirection(),
            "Expected redirect, got {}",
            response.status()
        );
        Self::location(response)
    }
}
