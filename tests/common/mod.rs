#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use notes_portal::{
    AppConfig, AppState, InMemoryRepository, auth, create_router,
    models::{NewNote, Note, User},
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const NOTE_TITLE: &str = "Test note";
pub const NOTE_TEXT: &str = "Test text";
pub const NOTE_SLUG: &str = "test-slug";

/// TestContext
///
/// A router backed by an in-memory repository, plus helpers to seed users and
/// notes and to send requests with or without a session.
pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub config: AppConfig,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let config = AppConfig::default();
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            config: config.clone(),
        };
        Self {
            repo,
            config,
            router: create_router(state),
        }
    }

    /// Creates a user that can only log in through an issued token.
    pub async fn user(&self, username: &str) -> User {
        self.repo
            .create_user(username, "!unusable")
            .await
            .expect("Failed to create test user")
    }

    /// Creates a user with a real Argon2 password hash.
    pub async fn user_with_password(&self, username: &str, password: &str) -> User {
        let hash = auth::hash_password(password).expect("Failed to hash password");
        self.repo
            .create_user(username, &hash)
            .await
            .expect("Failed to create test user")
    }

    pub async fn note(&self, author: &User) -> Note {
        self.note_with_slug(author, NOTE_SLUG).await
    }

    pub async fn note_with_slug(&self, author: &User, slug: &str) -> Note {
        self.repo
            .create_note(
                NewNote {
                    title: NOTE_TITLE.to_string(),
                    text: NOTE_TEXT.to_string(),
                    slug: slug.to_string(),
                },
                author.id,
            )
            .await
            .expect("Failed to create test note")
    }

    /// The `Cookie` header value of a logged-in session for `user`.
    pub fn session(&self, user: &User) -> String {
        let token =
            auth::issue_session_token(user.id, &self.config).expect("Failed to issue token");
        format!("{}={}", auth::SESSION_COOKIE, token)
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        session: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form_body(fields))).unwrap())
            .await
    }

    /// A bare POST: no body, no content type.
    pub async fn post_empty(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(cookie) = session {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond")
    }

    pub async fn notes_of(&self, author: Uuid) -> Vec<Note> {
        self.repo.get_notes_by_author(author).await
    }
}

/// Encodes `fields` as `application/x-www-form-urlencoded`.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).expect("Failed to encode form")
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

/// Asserts a `302 Found` to `expected`.
pub fn assert_redirects(response: &Response<Body>, expected: &str) {
    assert_eq!(response.status(), StatusCode::FOUND, "expected a 302 redirect");
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect without Location header");
    assert_eq!(location, expected);
}

pub fn login_redirect(next: &str) -> String {
    format!("{}?next={}", notes_portal::routes::paths::LOGIN, next)
}

/// The form data used by create/edit tests.
pub fn form_data() -> Vec<(&'static str, &'static str)> {
    vec![
        ("title", "Новый заголовок"),
        ("text", "Новый текст"),
        ("slug", "new-slug"),
    ]
}
