use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// User Router Module
///
/// Administrative oversight of registered patients.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users — admin-only listing, passwords never selected.
        .route("/users", get(handlers::list_users))
}
