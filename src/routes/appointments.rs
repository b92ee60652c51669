use crate::{AppState, handlers};
use axum::{Router, routing::{get, put}};

/// Appointment Router Module
///
/// The listing endpoint serves two roles with two different row shapes, so the
/// handler branches on the resolved `Identity` instead of using a rejecting
/// extractor. Booking is patient-only; status updates are admin-only.
pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        // GET /api/appointments — all appointments (admin) or own (patient).
        // POST /api/appointments — book a slot for the logged-in patient.
        .route(
            "/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        // PUT /api/appointments/{id} — admin overwrite of the completed/cancelled
        // flags. Appointments are never deleted, only flagged.
        .route("/appointments/{id}", put(handlers::update_appointment))
}
