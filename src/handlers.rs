use crate::{
    AppState,
    auth::{self, AuthUser},
    forms::{self, LOGIN_FORM, NOTE_FORM, SIGNUP_FORM},
    models::{
        BoundForm, FieldErrors, FormPage, ListPage, LoginForm, MessagePage, NoteForm, NotePage,
        SignupForm,
    },
    repository::RepoError,
    routes::{paths, redirect_found},
};
use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

// --- Query Structs ---

/// NextParam
///
/// The `next` query parameter carried by the login page: where to go after
/// a successful login.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct NextParam {
    /// Local path to return to after login.
    pub next: Option<String>,
}

// --- Page Helpers ---

fn note_form_page(data: NoteForm, errors: FieldErrors) -> Response {
    Json(FormPage::from(BoundForm::new(NOTE_FORM, data).with_errors(errors))).into_response()
}

fn login_form_page(mut data: LoginForm, errors: FieldErrors) -> Response {
    data.password.clear();
    Json(FormPage::from(BoundForm::new(LOGIN_FORM, data).with_errors(errors))).into_response()
}

fn signup_form_page(mut data: SignupForm, errors: FieldErrors) -> Response {
    data.password1.clear();
    data.password2.clear();
    Json(FormPage::from(BoundForm::new(SIGNUP_FORM, data).with_errors(errors))).into_response()
}

/// Maps a failed note insert/update. A slug conflict that slipped past form
/// cleaning (a concurrent write) is still reported on the slug field.
fn note_write_failed(data: NoteForm, err: RepoError) -> Response {
    match err {
        RepoError::SlugTaken(slug) => {
            let mut errors = FieldErrors::new();
            forms::add_error(&mut errors, "slug", forms::slug_taken(&slug));
            note_form_page(data, errors)
        }
        other => {
            tracing::error!("Note write failed: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Note Handlers ---

/// home
///
/// [Public Route] Landing page.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home page", body = MessagePage))
)]
pub async fn home() -> Json<MessagePage> {
    Json(MessagePage::new("Notes: a simple place to keep your notes."))
}

/// list_notes
///
/// [Authenticated Route] Lists the requester's notes. Notes of other users
/// are never part of `object_list`.
#[utoipa::path(
    get,
    path = "/notes/",
    responses(
        (status = 200, description = "My notes", body = ListPage),
        (status = 302, description = "Anonymous: redirect to login")
    )
)]
pub async fn list_notes(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<ListPage> {
    let object_list = state.repo.get_notes_by_author(id).await;
    Json(ListPage { object_list })
}

/// add_note_page
///
/// [Authenticated Route] An unbound `NoteForm`.
#[utoipa::path(
    get,
    path = "/add/",
    responses((status = 200, description = "Empty note form", body = FormPage<NoteForm>))
)]
pub async fn add_note_page(_user: AuthUser) -> Json<FormPage<NoteForm>> {
    Json(FormPage::from(BoundForm::new(NOTE_FORM, NoteForm::default())))
}

/// add_note
///
/// [Authenticated Route] Creates a note owned by the requester.
///
/// An empty slug is derived from the title. On validation failure the bound
/// form is returned with field errors and nothing is stored.
#[utoipa::path(
    post,
    path = "/add/",
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created: redirect to the success page"),
        (status = 200, description = "Invalid form", body = FormPage<NoteForm>)
    )
)]
pub async fn add_note(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Form(payload): Form<NoteForm>,
) -> Response {
    let cleaned = match forms::clean_note(state.repo.as_ref(), &payload, None).await {
        Ok(cleaned) => cleaned,
        Err(errors) => return note_form_page(payload, errors),
    };

    match state.repo.create_note(cleaned, id).await {
        Ok(note) => {
            tracing::info!(note_id = note.id, slug = %note.slug, author = %id, "Note created");
            redirect_found(paths::SUCCESS)
        }
        Err(e) => note_write_failed(payload, e),
    }
}

/// edit_note_page
///
/// [Authenticated Route] The `NoteForm` bound to an existing note.
///
/// *Authorization*: 404 if the note does not exist or belongs to someone else.
#[utoipa::path(
    get,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Bound note form", body = FormPage<NoteForm>),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn edit_note_page(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<FormPage<NoteForm>>, StatusCode> {
    match state.repo.get_note_authorized(&slug, id).await {
        Some(note) => Ok(Json(FormPage::from(BoundForm::new(
            NOTE_FORM,
            NoteForm::from(&note),
        )))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// edit_note
///
/// [Authenticated Route] Updates title, text and slug of the requester's note.
/// The author is never changed.
///
/// *Authorization*: the ownership check happens before the form is cleaned, so
/// a non-owner gets 404 regardless of what they submit.
#[utoipa::path(
    post,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated: redirect to the success page"),
        (status = 200, description = "Invalid form", body = FormPage<NoteForm>),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn edit_note(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Result<Form<NoteForm>, FormRejection>,
) -> Response {
    let Some(note) = state.repo.get_note_authorized(&slug, id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Form(payload) = match payload {
        Ok(form) => form,
        Err(rejection) => return rejection.into_response(),
    };

    let cleaned = match forms::clean_note(state.repo.as_ref(), &payload, Some(note.id)).await {
        Ok(cleaned) => cleaned,
        Err(errors) => return note_form_page(payload, errors),
    };

    match state.repo.update_note(note.id, id, cleaned).await {
        Ok(Some(updated)) => {
            tracing::info!(note_id = updated.id, slug = %updated.slug, "Note updated");
            redirect_found(paths::SUCCESS)
        }
        // Deleted between the ownership check and the update.
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => note_write_failed(payload, e),
    }
}

/// delete_note_page
///
/// [Authenticated Route] Delete confirmation for the requester's note.
#[utoipa::path(
    get,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Note to delete", body = NotePage),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_note_page(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NotePage>, StatusCode> {
    state
        .repo
        .get_note_authorized(&slug, id)
        .await
        .map(|note| Json(NotePage { note }))
        .ok_or(StatusCode::NOT_FOUND)
}

/// delete_note
///
/// [Authenticated Route] Deletes the requester's note.
///
/// *Authorization*: the repository deletes only when the author matches; zero
/// affected rows means missing or not owned, both answered with 404.
#[utoipa::path(
    post,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 302, description = "Deleted: redirect to the success page"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_note(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    if state.repo.delete_note(&slug, id).await {
        tracing::info!(slug = %slug, author = %id, "Note deleted");
        redirect_found(paths::SUCCESS)
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// note_detail
///
/// [Authenticated Route] A single note of the requester.
#[utoipa::path(
    get,
    path = "/note/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses(
        (status = 200, description = "Found", body = NotePage),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn note_detail(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NotePage>, StatusCode> {
    match state.repo.get_note_authorized(&slug, id).await {
        Some(note) => Ok(Json(NotePage { note })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// success
///
/// [Authenticated Route] Landing page after a create, edit or delete.
#[utoipa::path(
    get,
    path = "/done/",
    responses((status = 200, description = "Success page", body = MessagePage))
)]
pub async fn success(_user: AuthUser) -> Json<MessagePage> {
    Json(MessagePage::new("Done."))
}

// --- Account Handlers ---

/// login_page
///
/// [Public Route] An unbound `LoginForm`, carrying `next` from the query string.
#[utoipa::path(
    get,
    path = "/auth/login/",
    params(NextParam),
    responses((status = 200, description = "Login form", body = FormPage<LoginForm>))
)]
pub async fn login_page(Query(params): Query<NextParam>) -> Json<FormPage<LoginForm>> {
    Json(FormPage::from(BoundForm::new(
        LOGIN_FORM,
        LoginForm {
            next: params.next,
            ..LoginForm::default()
        },
    )))
}

/// login
///
/// [Public Route] Verifies credentials and starts a session.
///
/// *Flow*: clean the form, look up the user, verify the Argon2 hash, sign a
/// session token, set it as an HttpOnly cookie and redirect to `next` (local
/// paths only) or the home page.
#[utoipa::path(
    post,
    path = "/auth/login/",
    params(NextParam),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in: redirect to next"),
        (status = 200, description = "Invalid credentials", body = FormPage<LoginForm>)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<NextParam>,
    Form(mut payload): Form<LoginForm>,
) -> Response {
    if payload.next.is_none() {
        payload.next = params.next;
    }

    let username = match forms::clean_login(&payload) {
        Ok(username) => username,
        Err(errors) => return login_form_page(payload, errors),
    };

    let Some(credentials) = state.repo.get_credentials(&username).await else {
        tracing::info!(username = %username, "Login rejected: unknown user");
        return login_form_page(payload, forms::invalid_login());
    };

    // Argon2 verification is CPU-bound; run it on the blocking pool.
    let password = payload.password.clone();
    let hash = credentials.password_hash.clone();
    match tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!(username = %username, "Login rejected: wrong password");
            return login_form_page(payload, forms::invalid_login());
        }
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match auth::issue_session_token(credentials.id, &state.config) {
        Ok(token) => {
            tracing::info!(user_id = %credentials.id, "User logged in");
            let target = auth::safe_next(payload.next.as_deref()).to_string();
            (
                jar.add(auth::session_cookie(token, &state.config)),
                redirect_found(&target),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to sign session token: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// logout
///
/// [Public Route] Ends the session by clearing the cookie. Always 200.
#[utoipa::path(
    get,
    path = "/auth/logout/",
    responses((status = 200, description = "Logged out", body = MessagePage))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessagePage>) {
    (
        jar.remove(auth::expired_session_cookie()),
        Json(MessagePage::new("You have been logged out.")),
    )
}

/// signup_page
///
/// [Public Route] An unbound `SignupForm`.
#[utoipa::path(
    get,
    path = "/auth/signup/",
    responses((status = 200, description = "Signup form", body = FormPage<SignupForm>))
)]
pub async fn signup_page() -> Json<FormPage<SignupForm>> {
    Json(FormPage::from(BoundForm::new(SIGNUP_FORM, SignupForm::default())))
}

/// signup
///
/// [Public Route] Creates an account and redirects to the login page.
#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Registered: redirect to login"),
        (status = 200, description = "Invalid form", body = FormPage<SignupForm>)
    )
)]
pub async fn signup(State(state): State<AppState>, Form(payload): Form<SignupForm>) -> Response {
    let cleaned = match forms::clean_signup(&payload) {
        Ok(cleaned) => cleaned,
        Err(errors) => return signup_form_page(payload, errors),
    };

    // Argon2 hashing is CPU-bound; run it on the blocking pool.
    let password = cleaned.password.clone();
    let hash = match tokio::task::spawn_blocking(move || auth::hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            tracing::error!("Password hashing failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Err(e) => {
            tracing::error!("Password hashing task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.repo.create_user(&cleaned.username, &hash).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
            redirect_found(paths::LOGIN)
        }
        Err(RepoError::UsernameTaken(_)) => {
            let mut errors = FieldErrors::new();
            forms::add_error(&mut errors, "username", forms::USERNAME_TAKEN);
            signup_form_page(payload, errors)
        }
        Err(e) => {
            tracing::error!("Signup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
