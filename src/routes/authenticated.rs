use crate::{AppState, handlers, routes::paths};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every note page. The router is wrapped in the `auth_middleware` layer, so
/// anonymous requests never reach a handler; they are redirected to the login
/// page with `next` set to the requested path.
///
/// Owner-only pages (detail, edit, delete) answer 404 when the note belongs
/// to someone else. The ownership check lives in the repository queries.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /notes/
        // Lists the requester's notes only.
        .route(paths::LIST, get(handlers::list_notes))
        // GET/POST /add/
        // GET renders an empty NoteForm, POST creates a note.
        .route(paths::ADD, get(handlers::add_note_page).post(handlers::add_note))
        // GET/POST /edit/{slug}/
        .route(
            "/edit/{slug}/",
            get(handlers::edit_note_page).post(handlers::edit_note),
        )
        // GET/POST /delete/{slug}/
        // GET renders the confirmation page, POST deletes.
        .route(
            "/delete/{slug}/",
            get(handlers::delete_note_page).post(handlers::delete_note),
        )
        // GET /note/{slug}/
        .route("/note/{slug}/", get(handlers::note_detail))
        // GET /done/
        // Landing page after a successful create, edit or delete.
        .route(paths::SUCCESS, get(handlers::success))
}
