use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Doctor Router Module
///
/// The doctor catalogue is public to read so anonymous visitors can browse before
/// registering; every write goes through the `AdminUser` extractor in its handler.
pub fn doctor_routes() -> Router<AppState> {
    Router::new()
        // GET /api/doctors — public listing ordered by name.
        // POST /api/doctors — admin-only creation.
        .route(
            "/doctors",
            get(handlers::list_doctors).post(handlers::create_doctor),
        )
        // PUT /api/doctors/{id} — admin-only full overwrite (omitted fields are
        // erased, not preserved).
        // DELETE /api/doctors/{id} — admin-only unconditional delete.
        .route(
            "/doctors/{id}",
            put(handlers::update_doctor).delete(handlers::delete_doctor),
        )
}
