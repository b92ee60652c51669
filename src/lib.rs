use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;

// Per-resource route assembly.
pub mod routes;

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use session::SessionStore;

/// ApiDoc
///
/// Auto-generates the OpenAPI document for the application from the `#[utoipa::path]`
/// and `#[derive(utoipa::ToSchema)]` annotations. The resulting JSON is served at
/// `/api-docs/openapi.json` for API consumers and tooling.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::admin_login, handlers::logout,
        handlers::current_user, handlers::admin_check,
        handlers::list_doctors, handlers::create_doctor, handlers::update_doctor,
        handlers::delete_doctor,
        handlers::list_appointments, handlers::book_appointment, handlers::update_appointment,
        handlers::list_users, handlers::health_check,
    ),
    components(
        schemas(
            models::User, models::UserSummary, models::Doctor, models::Appointment,
            models::AppointmentWithDoctor, models::AppointmentOverview,
            models::RegisterRequest, models::LoginRequest, models::DoctorRequest,
            models::BookAppointmentRequest, models::AppointmentStatusRequest,
            models::MessageResponse, models::LoginResponse, models::HealthResponse,
        )
    ),
    tags(
        (name = "hospital-booking", description = "Hospital Appointment Booking API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, thread-safe container
/// holding all essential application services and configuration, shared across all
/// incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts database access behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Session layer: the server-side token -> identity table.
    pub sessions: SessionStore,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations let extractors and handlers pull individual components out
// of the shared AppState instead of depending on the whole struct.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(app_state: &AppState) -> SessionStore {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The session cookie travels with cross-origin requests from the browser
    // frontend, so this must be a credentialed CORS setup: a single exact origin
    // echoed back, credentials allowed. Wildcards are rejected by browsers here.
    let origin = state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: the generated OpenAPI document.
        .route("/api-docs/openapi.json", get(serve_openapi))
        // The API itself. Role enforcement happens inside the handlers via the
        // session extractors, since several paths mix roles across methods.
        .nest("/api", routes::api_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in a span
                // that carries the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation: returns the x-request-id header to the
                // client so frontend reports can be correlated with server logs.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: it extracts the
/// `x-request-id` header (if present) and includes it in the structured logging
/// metadata alongside the HTTP method and URI, so every log line of a single
/// request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
