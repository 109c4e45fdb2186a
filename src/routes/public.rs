use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session: the home page and the account flows
/// (login, logout, signup). Nothing here reads or writes notes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        .route(paths::HOME, get(handlers::home))
        // GET/POST /auth/login/
        // POST sets the session cookie and redirects to `next`.
        .route(paths::LOGIN, get(handlers::login_page).post(handlers::login))
        // GET/POST /auth/logout/
        // Clears the session cookie. Available to anonymous users as well.
        .route(paths::LOGOUT, get(handlers::logout).post(handlers::logout))
        // GET/POST /auth/signup/
        .route(paths::SIGNUP, get(handlers::signup_page).post(handlers::signup))
}
