//! Router Module Index
//!
//! Routes are split by access level. Access control is applied per module
//! with Axum layers, so a protected endpoint cannot be exposed by accident.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Routes accessible to everyone: home page and account flows.
pub mod public;

/// Routes behind the `AuthUser` extractor middleware. Anonymous requests are
/// redirected to the login page.
pub mod authenticated;

/// Route paths, named after the pages they serve.
pub mod paths {
    pub const HOME: &str = "/";
    pub const LIST: &str = "/notes/";
    pub const ADD: &str = "/add/";
    pub const SUCCESS: &str = "/done/";
    pub const LOGIN: &str = "/auth/login/";
    pub const LOGOUT: &str = "/auth/logout/";
    pub const SIGNUP: &str = "/auth/signup/";

    pub fn edit(slug: &str) -> String {
        format!("/edit/{slug}/")
    }

    pub fn delete(slug: &str) -> String {
        format!("/delete/{slug}/")
    }

    pub fn detail(slug: &str) -> String {
        format!("/note/{slug}/")
    }
}

/// A `302 Found` redirect. Axum's `Redirect::to` answers `303 See Other`;
/// browsers and form clients expect a plain 302 after a form post.
pub fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
