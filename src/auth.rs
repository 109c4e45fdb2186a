use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    repository::RepositoryState,
    routes::{paths, redirect_found},
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Claims
///
/// Payload of a session token, signed with the configured session secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    /// Expiration Time (exp): the token is rejected after this timestamp.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers compare `id`
/// against a note's author for every owner-only operation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// LoginRedirect
///
/// Rejection for anonymous requests to protected routes: a `302 Found` to the
/// login page carrying the original target as `next`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRedirect {
    pub next: String,
}

impl LoginRedirect {
    pub fn location(&self) -> String {
        format!("{}?next={}", paths::LOGIN, encode_next(&self.next))
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        redirect_found(&self.location())
    }
}

/// AuthUser Extractor Implementation
///
/// Resolves the session in three steps:
/// 1. Token Extraction: the `session` cookie, or an `Authorization: Bearer` header.
/// 2. Token Validation: signature and expiry via `jsonwebtoken`.
/// 3. DB Lookup: the subject must still exist.
///
/// Rejection: [`LoginRedirect`] on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let rejection = LoginRedirect {
            next: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| parts.uri.path().to_string()),
        };

        let Some(token) = session_token(parts) else {
            return Err(rejection);
        };

        let claims = match verify_session_token(&token, &config.session_secret) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                return Err(rejection);
            }
        };

        // The user may have been removed after the token was issued.
        let user = repo.get_user(claims.sub).await.ok_or(rejection)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// issue_session_token
///
/// Signs a session token for `user_id` that expires after the configured TTL.
pub fn issue_session_token(
    user_id: Uuid,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + config.session_ttl_secs as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

/// verify_session_token
///
/// Decodes a session token, checking the signature and expiry.
pub fn verify_session_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// The cookie set on a successful login.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.env == Env::Production)
        .build()
}

/// A removal cookie matching [`session_cookie`]'s path.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Hash a password with Argon2id, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Verify a password against a stored PHC hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Percent-encode a path for use as the `next` query value. `/` stays
/// readable, so `/edit/note-slug/` is passed through unchanged.
pub fn encode_next(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

/// Where to send the user after login: `next` if it is a local path,
/// otherwise the home page. Protocol-relative and backslash paths are refused,
/// as is anything with control characters: browsers drop tab, CR and LF from
/// URLs, so `/\t/host` would resolve as `//host`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => paths::HOME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_next_keeps_paths() {
        assert_eq!(encode_next("/edit/test-slug/"), "/edit/test-slug/");
        assert_eq!(encode_next("/notes/?page=2"), "/notes/%3Fpage%3D2");
    }

    #[test]
    fn test_login_redirect_location() {
        let redirect = LoginRedirect {
            next: "/add/".to_string(),
        };
        assert_eq!(redirect.location(), "/auth/login/?next=/add/");
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/notes/")), "/notes/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_safe_next_refuses_control_characters() {
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/\r\n/evil.example")), "/");
        assert_eq!(safe_next(Some("/\x00/notes/")), "/");
        assert_eq!(safe_next(Some("/edit/a-b/")), "/edit/a-b/");
    }

    #[test]
    fn test_session_token_roundtrip_and_expiry() {
        let config = AppConfig::default();
        let user_id = Uuid::from_u128(7);
        let token = issue_session_token(user_id, &config).unwrap();
        assert_eq!(verify_session_token(&token, &config.session_secret).unwrap().sub, user_id);
        assert!(verify_session_token(&token, "another-secret").is_err());

        // Default validation allows 60s of leeway, so backdate explicitly.
        let claims = Claims {
            sub: user_id,
            iat: 0,
            exp: 1,
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.session_secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_session_token(&stale, &config.session_secret).is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("correct-horse", "not-a-hash"));
    }
}
