use crate::models::{NewNote, Note, User, UserCredentials};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepoError
///
/// Failures of repository writes. Uniqueness conflicts are reported as their
/// own variants so callers can turn them into form errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("slug `{0}` is already taken")]
    SlugTaken(String),
    #[error("username `{0}` is already taken")]
    UsernameTaken(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see this
/// trait, so the Postgres store and the in-memory store are interchangeable.
///
/// Every note read or mutation that takes an `author` is scoped to that
/// author: a note owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_credentials(&self, username: &str) -> Option<UserCredentials>;
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError>;

    // --- Notes ---
    // Listing filter: only the author's notes, ordered by id.
    async fn get_notes_by_author(&self, author: Uuid) -> Vec<Note>;
    // Authorship guard: None when missing OR not owned by `author`.
    async fn get_note_authorized(&self, slug: &str, author: Uuid) -> Option<Note>;
    // Whether any note other than `exclude_id` uses `slug`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> bool;
    async fn create_note(&self, note: NewNote, author: Uuid) -> Result<Note, RepoError>;
    // Owner-Only: Ok(None) if the note is missing or not owned by `author`.
    async fn update_note(&self, id: i64, author: Uuid, note: NewNote) -> Result<Option<Note>, RepoError>;
    // Owner-Only: true only if a row was removed.
    async fn delete_note(&self, slug: &str, author: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn get_credentials(&self, username: &str) -> Option<UserCredentials> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_credentials error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new account. A duplicate username surfaces as `UsernameTaken`.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, username, password_hash, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, username, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::UsernameTaken(username.to_string())
            } else {
                RepoError::Database(e)
            }
        })
    }

    async fn get_notes_by_author(&self, author: Uuid) -> Vec<Note> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = $1 ORDER BY id",
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_notes_by_author error: {:?}", e);
            vec![]
        })
    }

    /// get_note_authorized
    ///
    /// Fetches a note by slug only if `author` owns it.
    async fn get_note_authorized(&self, slug: &str, author: Uuid) -> Option<Note> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, text, slug, author_id FROM notes WHERE slug = $1 AND author_id = $2",
        )
        .bind(slug)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_note_authorized error: {:?}", e);
            None
        })
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("slug_exists error: {:?}", e);
            false
        })
    }

    /// create_note
    ///
    /// Inserts a note. The unique index on `slug` backs up the form-level
    /// check; a conflict surfaces as `SlugTaken`.
    async fn create_note(&self, note: NewNote, author: Uuid) -> Result<Note, RepoError> {
        sqlx::query_as::<_, Note>(
            r#"INSERT INTO notes (title, text, slug, author_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, title, text, slug, author_id"#,
        )
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .bind(author)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::SlugTaken(note.slug.clone())
            } else {
                RepoError::Database(e)
            }
        })
    }

    /// update_note
    ///
    /// Rewrites title, text and slug. `author_id` is part of the filter and
    /// never part of the SET list.
    async fn update_note(&self, id: i64, author: Uuid, note: NewNote) -> Result<Option<Note>, RepoError> {
        sqlx::query_as::<_, Note>(
            r#"UPDATE notes
               SET title = $3, text = $4, slug = $5
               WHERE id = $1 AND author_id = $2
               RETURNING id, title, text, slug, author_id"#,
        )
        .bind(id)
        .bind(author)
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::SlugTaken(note.slug.clone())
            } else {
                RepoError::Database(e)
            }
        })
    }

    async fn delete_note(&self, slug: &str, author: Uuid) -> bool {
        match sqlx::query("DELETE FROM notes WHERE slug = $1 AND author_id = $2")
            .bind(slug)
            .bind(author)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_note error: {:?}", e);
                false
            }
        }
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryStore {
    users: Vec<(User, String)>,
    notes: BTreeMap<i64, Note>,
    last_note_id: i64,
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory, with the same uniqueness
/// and ownership rules as the Postgres schema. Used by the test suites.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<MemoryStore>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored note, regardless of author, ordered by id.
    pub async fn all_notes(&self) -> Vec<Note> {
        self.store.read().await.notes.values().cloned().collect()
    }

    pub async fn note_count(&self) -> usize {
        self.store.read().await.notes.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        let store = self.store.read().await;
        store.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())
    }

    async fn get_credentials(&self, username: &str) -> Option<UserCredentials> {
        let store = self.store.read().await;
        store
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .map(|(u, hash)| UserCredentials {
                id: u.id,
                username: u.username.clone(),
                password_hash: hash.clone(),
            })
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.users.iter().any(|(u, _)| u.username == username) {
            return Err(RepoError::UsernameTaken(username.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        store.users.push((user.clone(), password_hash.to_string()));
        Ok(user)
    }

    async fn get_notes_by_author(&self, author: Uuid) -> Vec<Note> {
        let store = self.store.read().await;
        store.notes.values().filter(|n| n.author == author).cloned().collect()
    }

    async fn get_note_authorized(&self, slug: &str, author: Uuid) -> Option<Note> {
        let store = self.store.read().await;
        store
            .notes
            .values()
            .find(|n| n.slug == slug && n.author == author)
            .cloned()
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> bool {
        let store = self.store.read().await;
        store
            .notes
            .values()
            .any(|n| n.slug == slug && Some(n.id) != exclude_id)
    }

    async fn create_note(&self, note: NewNote, author: Uuid) -> Result<Note, RepoError> {
        let mut store = self.store.write().await;
        if store.notes.values().any(|n| n.slug == note.slug) {
            return Err(RepoError::SlugTaken(note.slug));
        }
        store.last_note_id += 1;
        let created = Note {
            id: store.last_note_id,
            title: note.title,
            text: note.text,
            slug: note.slug,
            author,
        };
        store.notes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_note(&self, id: i64, author: Uuid, note: NewNote) -> Result<Option<Note>, RepoError> {
        let mut store = self.store.write().await;
        if store.notes.values().any(|n| n.slug == note.slug && n.id != id) {
            return Err(RepoError::SlugTaken(note.slug));
        }
        let Some(existing) = store.notes.get_mut(&id).filter(|n| n.author == author) else {
            return Ok(None);
        };
        existing.title = note.title;
        existing.text = note.text;
        existing.slug = note.slug;
        Ok(Some(existing.clone()))
    }

    async fn delete_note(&self, slug: &str, author: Uuid) -> bool {
        let mut store = self.store.write().await;
        let id = store
            .notes
            .values()
            .find(|n| n.slug == slug && n.author == author)
            .map(|n| n.id);
        match id {
            Some(id) => store.notes.remove(&id).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(slug: &str) -> NewNote {
        NewNote {
            title: "Title".to_string(),
            text: "Text".to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_slug_is_unique() {
        let repo = InMemoryRepository::new();
        let author = repo.create_user("author", "hash").await.unwrap();

        repo.create_note(new_note("same"), author.id).await.unwrap();
        let err = repo.create_note(new_note("same"), author.id).await.unwrap_err();

        assert!(matches!(err, RepoError::SlugTaken(ref s) if s == "same"));
        assert_eq!(repo.note_count().await, 1);
    }

    #[tokio::test]
    async fn test_in_memory_update_is_owner_only() {
        let repo = InMemoryRepository::new();
        let author = repo.create_user("author", "hash").await.unwrap();
        let other = repo.create_user("other", "hash").await.unwrap();
        let note = repo.create_note(new_note("mine"), author.id).await.unwrap();

        let denied = repo.update_note(note.id, other.id, new_note("stolen")).await.unwrap();
        assert!(denied.is_none());

        let updated = repo
            .update_note(note.id, author.id, new_note("renamed"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.slug, "renamed");
        assert_eq!(updated.author, author.id);
    }

    #[tokio::test]
    async fn test_in_memory_duplicate_username() {
        let repo = InMemoryRepository::new();
        repo.create_user("author", "hash").await.unwrap();
        let err = repo.create_user("author", "hash").await.unwrap_err();
        assert!(matches!(err, RepoError::UsernameTaken(_)));
    }
}
