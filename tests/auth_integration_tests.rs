use hospital_booking::{
    AppConfig, AppState, MemoryRepository, SessionStore, create_router,
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

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn register(address: &str, c: &reqwest::Client, email: &str) -> reqwest::Response {
    c.post(format!("{}/api/register", address))
        .json(&serde_json::json!({
            "fname": "Test", "lname": "Patient", "email": email, "password": "pw"
        }))
        .send()
        .await
        .expect("register req fail")
}

async fn login(address: &str, c: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
    c.post(format!("{}/api/login", address))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .expect("login req fail")
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
async fn registration_rejects_each_missing_required_field() {
    let address = spawn_app().await;
    let c = client();

    for field in ["fname", "lname", "email", "password"] {
        let mut payload = serde_json::json!({
            "fname": "A", "lname": "B", "email": "a@b.com", "password": "pw"
        });
        payload.as_object_mut().unwrap().remove(field);

        let resp = c
            .post(format!("{}/api/register", address))
            .json(&payload)
            .send()
            .await
            .expect("register req fail");
        assert_eq!(resp.status(), 400, "missing {field} must be rejected");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], format!("{field} is required"));
    }

    // Empty strings count as missing too.
    let resp = c
        .post(format!("{}/api/register", address))
        .json(&serde_json::json!({
            "fname": "", "lname": "B", "email": "a@b.com", "password": "pw"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Nothing was created: no rejected payload can log in.
    let resp = login(&address, &c, "a@b.com", "pw").await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let address = spawn_app().await;
    let c = client();

    assert_eq!(register(&address, &c, "dup@test.com").await.status(), 201);

    let resp = register(&address, &c, "dup@test.com").await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");

    // Exactly one row persists.
    let admin = login_admin(&address).await;
    let users: Vec<serde_json::Value> = admin
        .get(format!("{}/api/users", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let address = spawn_app().await;
    let c = client();
    register(&address, &c, "known@test.com").await;

    // Unknown email and wrong password must produce the same error shape.
    let unknown = login(&address, &c, "nobody@test.com", "pw").await;
    assert_eq!(unknown.status(), 401);
    let unknown_body: serde_json::Value = unknown.json().await.unwrap();

    let wrong = login(&address, &c, "known@test.com", "wrong").await;
    assert_eq!(wrong.status(), 401);
    let wrong_body: serde_json::Value = wrong.json().await.unwrap();

    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_requires_both_credentials() {
    let address = spawn_app().await;
    let c = client();

    for payload in [
        serde_json::json!({"email": "a@b.com"}),
        serde_json::json!({"password": "pw"}),
        serde_json::json!({"email": "", "password": "pw"}),
    ] {
        let resp = c
            .post(format!("{}/api/login", address))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Email and password are required");
    }
}

#[tokio::test]
async fn session_authorizes_current_user_fetch() {
    let address = spawn_app().await;
    let c = client();
    register(&address, &c, "me@test.com").await;
    assert_eq!(login(&address, &c, "me@test.com", "pw").await.status(), 200);

    let resp = c
        .get(format!("{}/api/user", address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["email"], "me@test.com");
    assert_eq!(body["fname"], "Test");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn current_user_requires_a_session() {
    let address = spawn_app().await;
    let resp = client()
        .get(format!("{}/api/user", address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn admin_login_and_check() {
    let address = spawn_app().await;

    let bad = client();
    let resp = bad
        .post(format!("{}/api/admin/login", address))
        .json(&serde_json::json!({"email": "admin@hospital.com", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid admin credentials");

    // The probe fails before login and succeeds after.
    let resp = bad
        .get(format!("{}/api/admin/check", address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let admin = login_admin(&address).await;
    let resp = admin
        .get(format!("{}/api/admin/check", address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Admin authenticated");
}

#[tokio::test]
async fn roles_are_not_interchangeable() {
    let address = spawn_app().await;

    // An admin session carries no user id, so user-only endpoints reject it.
    let admin = login_admin(&address).await;
    let resp = admin.get(format!("{}/api/user", address)).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    // A user session does not satisfy admin-only endpoints.
    let c = client();
    register(&address, &c, "plain@test.com").await;
    login(&address, &c, "plain@test.com", "pw").await;

    let resp = c.get(format!("{}/api/users", address)).send().await.unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Admin access required");

    let resp = c
        .post(format!("{}/api/doctors", address))
        .json(&serde_json::json!({"fname": "X", "lname": "Y", "department": "Z"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = c
        .put(format!("{}/api/appointments/1", address))
        .json(&serde_json::json!({"completed": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let address = spawn_app().await;
    let c = client();
    register(&address, &c, "out@test.com").await;
    login(&address, &c, "out@test.com", "pw").await;
    assert_eq!(
        c.get(format!("{}/api/user", address)).send().await.unwrap().status(),
        200
    );

    let resp = c
        .post(format!("{}/api/logout", address))
        .send()
        .await
        .expect("logout req fail");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");

    // Back to the same unauthenticated error as before any login.
    let resp = c.get(format!("{}/api/user", address)).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not authenticated");

    // Logout is idempotent.
    let resp = c.post(format!("{}/api/logout", address)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
