/// Router Module Index
///
/// Organizes the application's routing logic into per-resource modules. Access
/// control is not applied at the router level here: every protected handler
/// declares its own `AuthUser`/`AdminUser` extractor, because several paths mix
/// roles across methods (`/doctors` is public to read and admin-only to write,
/// `/appointments` is readable by two different roles).
use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Registration, login (user and admin), logout and session probes.
pub mod auth;

/// Doctor listing (public) and admin-only doctor management.
pub mod doctors;

/// Appointment listing, booking and admin status updates.
pub mod appointments;

/// Admin-only user listing.
pub mod users;

/// api_routes
///
/// Assembles every endpoint of the API. The caller nests this under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Unauthenticated liveness probe for monitoring and the frontend's
        // backend-status widget.
        .route("/health", get(handlers::health_check))
        .merge(auth::auth_routes())
        .merge(doctors::doctor_routes())
        .merge(appointments::appointment_routes())
        .merge(users::user_routes())
}
