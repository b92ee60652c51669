use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Auth Router Module
///
/// Registration, the two login flows, logout and the two session probes. Only
/// `GET /user` requires an identity (a user session); everything else is reachable
/// anonymously, including logout, which is a no-op without a session.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /api/register
        // Creates a patient account. Does not establish a session; the frontend
        // sends the user to the login form afterwards.
        .route("/register", post(handlers::register))
        // POST /api/login
        // Patient login. Sets the opaque session cookie on success.
        .route("/login", post(handlers::login))
        // POST /api/admin/login
        // Shared-administrator login against the configured credentials.
        .route("/admin/login", post(handlers::admin_login))
        // GET /api/admin/check
        // Lets the admin dashboard restore a persisted session on reload.
        .route("/admin/check", get(handlers::admin_check))
        // POST /api/logout
        // Clears whatever session the cookie points at. Idempotent.
        .route("/logout", post(handlers::logout))
        // GET /api/user
        // Current-user fetch for the frontend auth context. User sessions only;
        // an admin session is rejected here by design.
        .route("/user", get(handlers::current_user))
}
