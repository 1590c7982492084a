//! Integration tests for Devgon.
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! over in-memory backends, so no database or server is needed:
//!
//! ```bash
//! cargo test -p devgon-integration-tests
//! ```
//!
//! [`TestApp`] owns the backends; each [`TestClient`] is one browser with its
//! own session cookie.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use devgon_core::{Email, MedicineId, Price, UserRole};
use devgon_storefront::app;
use devgon_storefront::backend::blob::MemoryBlobStore;
use devgon_storefront::backend::memory::{MemoryDocumentStore, MemoryIdentityProvider};
use devgon_storefront::config::StorefrontConfig;
use devgon_storefront::middleware::create_session_layer;
use devgon_storefront::middleware::session::SESSION_COOKIE_NAME;
use devgon_storefront::services::catalog::{CatalogService, MedicineInput};
use devgon_storefront::services::users::UserAdmin;
use devgon_storefront::state::{AppState, Backends};

/// Boundary used by [`TestClient::post_multipart`].
const BOUNDARY: &str = "devgon-test-boundary";

/// An in-process storefront over in-memory backends.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub documents: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StorefrontConfig::in_memory("http://localhost:3000"))
    }

    #[must_use]
    pub fn with_config(config: StorefrontConfig) -> Self {
        let documents = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let backends = Backends {
            documents: documents.clone(),
            identity: Arc::new(MemoryIdentityProvider::new()),
            blobs: blobs.clone(),
        };

        let sessions = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, backends);
        let router = app(state.clone(), sessions);

        Self {
            router,
            state,
            documents,
            blobs,
        }
    }

    /// A fresh browser with no session.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Add a medicine directly through the catalog service.
    pub async fn seed_medicine(&self, name: &str, rupees: i64) -> MedicineId {
        CatalogService::new(self.documents.as_ref(), self.blobs.as_ref())
            .add(
                MedicineInput {
                    name: name.to_owned(),
                    description: format!("{name} description"),
                    price: Price::from_rupees(rupees),
                },
                None,
            )
            .await
            .unwrap()
            .id
    }

    /// Give a registered user the admin role.
    pub async fn promote(&self, email: &str) {
        self.set_role(email, UserRole::Admin).await;
    }

    /// Take the admin role away again, leaving any session open.
    pub async fn demote(&self, email: &str) {
        self.set_role(email, UserRole::User).await;
    }

    async fn set_role(&self, email: &str, role: UserRole) {
        let users = UserAdmin::new(self.documents.as_ref());
        let user = users
            .find_by_email(&Email::parse(email).unwrap())
            .await
            .unwrap()
            .unwrap();
        users.set_role(&user.id, role).await.unwrap();
    }

    /// Register a customer and keep them signed in on a new client.
    pub async fn customer(&self, email: &str) -> TestClient {
        let mut client = self.client();
        let response = client.register(email).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        client
    }

    /// Register a user, promote them, and sign them in on a new client.
    pub async fn admin(&self, email: &str) -> TestClient {
        let mut client = self.customer(email).await;
        self.promote(email).await;
        client.post_json("/auth/logout", &json!({})).await;
        let response = client.login(email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        client
    }
}

/// Password used by the registration helpers.
pub const PASSWORD: &str = "brahmi-tonic-42";

/// A response with its body parsed as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// One browser: carries its session cookie between requests.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty()).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, Body::empty()).await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    /// POST `multipart/form-data` with text fields and an optional file
    /// `(field, file name, bytes)`.
    pub async fn post_multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        self.send(Method::POST, uri, Some(&content_type), Body::from(body))
            .await
    }

    pub async fn register(&mut self, email: &str) -> TestResponse {
        self.post_json(
            "/auth/register",
            &json!({
                "name": "Asha Verma",
                "email": email,
                "password": PASSWORD,
                "password_confirm": PASSWORD,
                "phone": "9876543210",
                "address": "14 FC Road, Pune",
            }),
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/auth/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn send(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            self.store_cookie(value.to_str().unwrap());
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default().trim();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        if name != SESSION_COOKIE_NAME {
            return;
        }
        self.cookie = if value.is_empty() {
            None
        } else {
            Some(pair.to_owned())
        };
    }
}
