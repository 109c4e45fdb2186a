use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Public view of an account from the `users` table. The password hash lives
/// only in [`UserCredentials`] and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used by the login flow to verify a password.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Note
///
/// A note from the `notes` table. `author` maps to the `author_id` column and
/// never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub slug: String,
    #[sqlx(rename = "author_id")]
    pub author: Uuid,
}

/// NewNote
///
/// Cleaned note data, produced by form validation and consumed by the
/// repository for both inserts and updates.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

// --- Form Payloads (Input Schemas) ---

/// NoteForm
///
/// Raw submission for creating or editing a note. Missing fields deserialize
/// as empty strings so that validation, not the extractor, reports them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Leave empty to derive the slug from the title.
    #[serde(default)]
    pub slug: String,
}

impl From<&Note> for NoteForm {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }
}

/// SignupForm
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// LoginForm
///
/// `next` is the local path to return to after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

// --- Page Contexts (Output Schemas) ---

/// Field name to error messages. Errors not tied to a field use `__all__`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// BoundForm
///
/// A form together with the data it was bound to and any validation errors.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BoundForm<T> {
    /// Form kind, e.g. `NoteForm`.
    pub name: String,
    pub data: T,
    pub errors: FieldErrors,
}

impl<T> BoundForm<T> {
    pub fn new(name: &str, data: T) -> Self {
        Self {
            name: name.to_string(),
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

/// FormPage
///
/// Context of a page that renders a form (add, edit, login, signup).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormPage<T> {
    pub form: BoundForm<T>,
}

impl<T> From<BoundForm<T>> for FormPage<T> {
    fn from(form: BoundForm<T>) -> Self {
        Self { form }
    }
}

/// ListPage
///
/// Context of the note list: only the requester's notes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ListPage {
    pub object_list: Vec<Note>,
}

/// NotePage
///
/// Context of the detail and delete-confirmation pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NotePage {
    pub note: Note,
}

/// MessagePage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessagePage {
    pub message: String,
}

impl MessagePage {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
