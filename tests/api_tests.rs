use hospital_booking::{
    AppConfig, AppState, MemoryRepository, SessionStore, create_router,
    models::{AppointmentOverview, AppointmentWithDoctor},
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_app() -> String {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        sessions: SessionStore::new(),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

/// Cookie-carrying client; each client is an independent browser session.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn login_admin(address: &str) -> reqwest::Client {
    let admin = client();
    let resp = admin
        .post(format!("{}/api/admin/login", address))
        .json(&serde_json::json!({"email": "admin@hospital.com", "password": "admin123"}))
        .send()
        .await
        .expect("admin login req fail");
    assert_eq!(resp.status(), 200);
    admin
}

#[tokio::test]
async fn test_health_check() {
    let address = spawn_app().await;
    let response = client()
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Hospital Booking API is running");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let address = spawn_app().await;
    let response = client()
        .get(format!("{}/api-docs/openapi.json", address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc["paths"]["/api/appointments"].is_object());
}

#[tokio::test]
async fn test_end_to_end_booking_flow() {
    let address = spawn_app().await;

    // Register patient A and log in.
    let patient = client();
    let resp = patient
        .post(format!("{}/api/register", address))
        .json(&serde_json::json!({
            "fname": "Ada", "lname": "Osei", "email": "ada@test.com",
            "password": "pw123", "age": 34
        }))
        .send()
        .await
        .expect("register req fail");
    assert_eq!(resp.status(), 201);

    let resp = patient
        .post(format!("{}/api/login", address))
        .json(&serde_json::json!({"email": "ada@test.com", "password": "pw123"}))
        .send()
        .await
        .expect("login req fail");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["fname"], "Ada");

    // Admin creates the doctor to book.
    let admin = login_admin(&address).await;
    let resp = admin
        .post(format!("{}/api/doctors", address))
        .json(&serde_json::json!({
            "fname": "Grace", "lname": "Mensah", "department": "Cardiology",
            "description": "Senior consultant", "timeranges": "Mon-Fri 9-17", "yoe": 12
        }))
        .send()
        .await
        .expect("create doctor req fail");
    assert_eq!(resp.status(), 201);

    let doctors: Vec<serde_json::Value> = admin
        .get(format!("{}/api/doctors", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let doctor_id = doctors[0]["id"].as_i64().unwrap();

    // Patient books a slot.
    let resp = patient
        .post(format!("{}/api/appointments", address))
        .json(&serde_json::json!({"doctorid": doctor_id, "time": "2026-09-01 10:00"}))
        .send()
        .await
        .expect("book req fail");
    assert_eq!(resp.status(), 201);

    // Patient scope: own appointment with doctor fields joined.
    let mine: Vec<AppointmentWithDoctor> = patient
        .get(format!("{}/api/appointments", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].doctorid, doctor_id);
    assert_eq!(mine[0].time, "2026-09-01 10:00");
    assert_eq!(mine[0].doctor_fname.as_deref(), Some("Grace"));
    assert_eq!(mine[0].department.as_deref(), Some("Cardiology"));
    assert!(!mine[0].completed);
    assert!(!mine[0].cancelled);

    // Admin scope: the same appointment with patient fields joined too.
    let all: Vec<AppointmentOverview> = admin
        .get(format!("{}/api/appointments", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].patient_fname, "Ada");
    assert_eq!(all[0].patient_email, "ada@test.com");
    assert_eq!(all[0].doctor_lname.as_deref(), Some("Mensah"));
}

#[tokio::test]
async fn test_anonymous_appointment_listing_is_rejected() {
    let address = spawn_app().await;
    let resp = client()
        .get(format!("{}/api/appointments", address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");
}
