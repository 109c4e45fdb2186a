mod common;

use axum::http::StatusCode;
use common::{TestContext, assert_redirects, login_redirect};
use notes_portal::routes::paths;
use tokio::test;

#[test]
async fn test_page_availability_for_anonymous_user() {
    let ctx = TestContext::new();
    for url in [paths::HOME, paths::LOGIN, paths::LOGOUT, paths::SIGNUP] {
        let response = ctx.get(url, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {url}");
    }
}

#[test]
async fn test_page_availability_for_auth_user() {
    let ctx = TestContext::new();
    let not_author = ctx.user("not_author").await;
    let session = ctx.session(&not_author);

    for url in [paths::LIST, paths::ADD, paths::SUCCESS] {
        let response = ctx.get(url, Some(&session)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {url}");
    }
}

#[test]
async fn test_note_exists() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let note = ctx.note(&author).await;

    assert_eq!(ctx.repo.note_count().await, 1);
    assert_eq!(note.title, "Test note");
}

#[test]
async fn test_empty_db() {
    let ctx = TestContext::new();
    assert_eq!(ctx.repo.note_count().await, 0);
}

#[test]
async fn test_availability_for_author_and_not_author() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let not_author = ctx.user("not_author").await;
    let note = ctx.note(&author).await;

    let cases = [
        (ctx.session(&author), StatusCode::OK),
        (ctx.session(&not_author), StatusCode::NOT_FOUND),
    ];
    for (session, expected) in cases {
        for url in [
            paths::detail(&note.slug),
            paths::edit(&note.slug),
            paths::delete(&note.slug),
        ] {
            let response = ctx.get(&url, Some(&session)).await;
            assert_eq!(response.status(), expected, "GET {url}");
        }
    }
}

#[test]
async fn test_unknown_slug_is_not_found() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let session = ctx.session(&author);

    let response = ctx.get(&paths::detail("missing"), Some(&session)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_redirects_for_anonymous_user() {
    let ctx = TestContext::new();
    let author = ctx.user("author").await;
    let note = ctx.note(&author).await;

    let urls = [
        paths::detail(&note.slug),
        paths::edit(&note.slug),
        paths::delete(&note.slug),
        paths::LIST.to_string(),
        paths::ADD.to_string(),
        paths::SUCCESS.to_string(),
    ];
    for url in urls {
        let response = ctx.get(&url, None).await;
        assert_redirects(&response, &login_redirect(&url));
    }
}

#[test]
async fn test_redirect_keeps_query_string() {
    let ctx = TestContext::new();
    let response = ctx.get("/notes/?page=2", None).await;
    assert_redirects(&response, "/auth/login/?next=/notes/%3Fpage%3D2");
}

#[test]
async fn test_invalid_session_is_anonymous() {
    let ctx = TestContext::new();
    let response = ctx.get(paths::LIST, Some("session=not-a-token")).await;
    assert_redirects(&response, &login_redirect(paths::LIST));
}

#[test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let response = ctx.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
