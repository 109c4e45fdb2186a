//! Form cleaning for notes and accounts.
//!
//! Cleaning never fails with an error type: it either produces cleaned data or
//! a [`FieldErrors`] map that is rendered back with the form.

use crate::{
    models::{FieldErrors, LoginForm, NON_FIELD_ERRORS, NewNote, NoteForm, SignupForm},
    repository::Repository,
    slug::{self, SLUG_MAX_LENGTH},
};

/// Appended to a conflicting slug to form the slug field error.
pub const WARNING: &str = " - такой slug уже существует, придумайте уникальное значение!";

pub const NOTE_FORM: &str = "NoteForm";
pub const LOGIN_FORM: &str = "LoginForm";
pub const SIGNUP_FORM: &str = "SignupForm";

pub const TITLE_MAX_LENGTH: usize = 100;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const REQUIRED: &str = "Обязательное поле.";
pub const INVALID_SLUG: &str =
    "Значение должно состоять только из латинских букв, цифр, знаков подчеркивания или дефиса.";
pub const UNDERIVABLE_SLUG: &str =
    "Не удалось сформировать slug из заголовка, укажите его вручную.";
pub const INVALID_USERNAME: &str =
    "Имя пользователя может содержать только буквы, цифры и символы @/./+/-/_.";
pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
pub const PASSWORD_MISMATCH: &str = "Введённые пароли не совпадают.";
pub const INVALID_LOGIN: &str =
    "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";

pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

pub fn too_long(max: usize, actual: usize) -> String {
    format!("Убедитесь, что это значение содержит не более {max} символов (сейчас {actual}).")
}

/// The slug field error for a slug that another note already uses.
pub fn slug_taken(slug: &str) -> String {
    format!("{slug}{WARNING}")
}

fn required(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.is_empty() {
        add_error(errors, field, REQUIRED);
        false
    } else {
        true
    }
}

/// clean_note
///
/// Validates a note submission and resolves its slug.
///
/// An empty slug is derived from the title. The resolved slug must not be used
/// by any note except `instance` (the note being edited, if any).
pub async fn clean_note(
    repo: &dyn Repository,
    form: &NoteForm,
    instance: Option<i64>,
) -> Result<NewNote, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = form.title.trim();
    let text = form.text.trim();
    let submitted_slug = form.slug.trim();

    let title_ok = required(&mut errors, "title", title) && {
        let len = title.chars().count();
        if len > TITLE_MAX_LENGTH {
            add_error(&mut errors, "title", too_long(TITLE_MAX_LENGTH, len));
            false
        } else {
            true
        }
    };
    required(&mut errors, "text", text);

    let resolved = if submitted_slug.is_empty() {
        // Without a valid title there is nothing to derive from; the title
        // error is enough.
        title_ok
            .then(|| slug::truncate(&slug::slugify(title)))
            .and_then(|derived| {
                if derived.is_empty() {
                    add_error(&mut errors, "slug", UNDERIVABLE_SLUG);
                    None
                } else {
                    Some(derived)
                }
            })
    } else {
        let len = submitted_slug.chars().count();
        if len > SLUG_MAX_LENGTH {
            add_error(&mut errors, "slug", too_long(SLUG_MAX_LENGTH, len));
            None
        } else if !slug::is_valid(submitted_slug) {
            add_error(&mut errors, "slug", INVALID_SLUG);
            None
        } else {
            Some(submitted_slug.to_string())
        }
    };

    if let Some(candidate) = &resolved {
        if repo.slug_exists(candidate, instance).await {
            add_error(&mut errors, "slug", slug_taken(candidate));
        }
    }

    match resolved {
        Some(slug) if errors.is_empty() => Ok(NewNote {
            title: title.to_string(),
            text: text.to_string(),
            slug,
        }),
        _ => Err(errors),
    }
}

/// CleanedSignup
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSignup {
    pub username: String,
    pub password: String,
}

/// clean_signup
///
/// Field-level checks only; username uniqueness is enforced by the repository.
pub fn clean_signup(form: &SignupForm) -> Result<CleanedSignup, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = form.username.trim();

    if required(&mut errors, "username", username) {
        let len = username.chars().count();
        if len > USERNAME_MAX_LENGTH {
            add_error(&mut errors, "username", too_long(USERNAME_MAX_LENGTH, len));
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            add_error(&mut errors, "username", INVALID_USERNAME);
        }
    }

    let has_password1 = required(&mut errors, "password1", &form.password1);
    let has_password2 = required(&mut errors, "password2", &form.password2);
    if has_password1 && has_password2 {
        if form.password1 != form.password2 {
            add_error(&mut errors, "password2", PASSWORD_MISMATCH);
        } else if form.password1.chars().count() < PASSWORD_MIN_LENGTH {
            add_error(
                &mut errors,
                "password2",
                format!(
                    "Введённый пароль слишком короткий. Он должен содержать как минимум {PASSWORD_MIN_LENGTH} символов."
                ),
            );
        }
    }

    if errors.is_empty() {
        Ok(CleanedSignup {
            username: username.to_string(),
            password: form.password1.clone(),
        })
    } else {
        Err(errors)
    }
}

/// clean_login
///
/// Presence checks for the login form. Returns the trimmed username.
pub fn clean_login(form: &LoginForm) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = form.username.trim();
    required(&mut errors, "username", username);
    required(&mut errors, "password", &form.password);
    if errors.is_empty() {
        Ok(username.to_string())
    } else {
        Err(errors)
    }
}

/// The error map for a login attempt with wrong credentials.
pub fn invalid_login() -> FieldErrors {
    let mut errors = FieldErrors::new();
    add_error(&mut errors, NON_FIELD_ERRORS, INVALID_LOGIN);
    errors
}
