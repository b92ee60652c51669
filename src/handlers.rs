use crate::{
    AppState,
    error::ApiError,
    models::{
        AppointmentOverview, AppointmentStatusRequest, AppointmentWithDoctor,
        BookAppointmentRequest, Doctor, DoctorRequest, HealthResponse, LoginRequest, LoginResponse,
        MessageResponse, NewDoctor, NewUser, RegisterRequest, User, UserSummary,
    },
    session::{AdminUser, AuthUser, Identity, Session, removal_cookie, session_cookie, session_token},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// Checks a required request field: present and non-empty, mirroring the truthiness
/// check of the original API (an empty string counts as missing).
fn require(value: &Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::Validation(format!("{field} is required"))),
    }
}

// --- Authentication & Registration ---

/// register
///
/// [Public Route] Creates a new patient account. Reports the first missing required
/// field; rejects an email that already has an account. Does not log the new user in.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Missing field or duplicate email")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let fname = require(&payload.fname, "fname")?;
    let lname = require(&payload.lname, "lname")?;
    let email = require(&payload.email, "email")?;
    let password = require(&payload.password, "password")?;

    if state
        .repo
        .email_exists(&email)
        .await
        .map_err(|_| ApiError::Storage("Registration failed".to_string()))?
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let user = NewUser {
        fname,
        lname,
        age: payload.age,
        email,
        phone: payload.phone.clone(),
        password,
    };
    state
        .repo
        .create_user(&user)
        .await
        .map_err(|_| ApiError::Storage("Registration failed".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// login
///
/// [Public Route] Authenticates a patient by exact email/password match and
/// establishes a user session behind a fresh opaque cookie. The 401 message is
/// identical for an unknown email and a wrong password.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let (email, password) = match (payload.email.as_deref(), payload.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }
    };

    let user = state
        .repo
        .find_user_by_credentials(email, password)
        .await
        .map_err(|_| ApiError::Storage("Login failed".to_string()))?
        .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

    // A re-login through an existing cookie replaces the old session entirely.
    if let Some(token) = session_token(&jar) {
        state.sessions.remove(&token);
    }
    let token = state.sessions.insert(Identity::User {
        id: user.id,
        email: user.email.clone(),
    });

    Ok((
        jar.add(session_cookie(token)),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user,
        }),
    ))
}

/// admin_login
///
/// [Public Route] Authenticates the shared administrator against the configured
/// credentials and establishes an admin session. The admin is not a user row.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Admin logged in", body = MessageResponse),
        (status = 401, description = "Invalid admin credentials")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let valid = payload.email.as_deref() == Some(state.config.admin_email.as_str())
        && payload.password.as_deref() == Some(state.config.admin_password.as_str());
    if !valid {
        return Err(ApiError::Authentication(
            "Invalid admin credentials".to_string(),
        ));
    }

    if let Some(token) = session_token(&jar) {
        state.sessions.remove(&token);
    }
    let token = state.sessions.insert(Identity::Admin);

    Ok((
        jar.add(session_cookie(token)),
        Json(MessageResponse::new("Admin login successful")),
    ))
}

/// logout
///
/// [Any Caller] Clears the session unconditionally and always returns 200; logging
/// out without a session is a no-op, not an error.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(token) = session_token(&jar) {
        state.sessions.remove(&token);
    }
    (
        jar.remove(removal_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// current_user
///
/// [User Route] Returns the logged-in patient's identity subset. 404 is the
/// distinct case where the session is valid but the user row is gone (deleted
/// out-of-band), as opposed to the 401 of not being logged in at all.
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = UserSummary),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User row no longer exists")
    )
)]
pub async fn current_user(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserSummary>, ApiError> {
    state
        .repo
        .find_user_by_id(user.id)
        .await
        .map_err(|_| ApiError::Storage("Failed to load user".to_string()))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// admin_check
///
/// [Public Route] Probe used by the frontend to restore a persisted admin session.
/// Pure check, no side effects; 401 rather than 403 so it mirrors the login probe.
#[utoipa::path(
    get,
    path = "/api/admin/check",
    responses(
        (status = 200, description = "Admin session active", body = MessageResponse),
        (status = 401, description = "No admin session")
    )
)]
pub async fn admin_check(Session(identity): Session) -> Result<Json<MessageResponse>, ApiError> {
    match identity {
        Identity::Admin => Ok(Json(MessageResponse::new("Admin authenticated"))),
        _ => Err(ApiError::Authentication(
            "Not authenticated as admin".to_string(),
        )),
    }
}

// --- Doctors ---

/// list_doctors
///
/// [Public Route] Lists every doctor ordered by first then last name. An empty
/// hospital is an empty list, not an error.
#[utoipa::path(
    get,
    path = "/api/doctors",
    responses((status = 200, description = "All doctors", body = [Doctor]))
)]
pub async fn list_doctors(State(state): State<AppState>) -> Result<Json<Vec<Doctor>>, ApiError> {
    let doctors = state
        .repo
        .list_doctors()
        .await
        .map_err(|_| ApiError::Storage("Failed to load doctors".to_string()))?;
    Ok(Json(doctors))
}

/// create_doctor
///
/// [Admin Route] Adds a doctor. Requires fname, lname and department; description
/// and timeranges default to empty strings, years of experience to zero.
#[utoipa::path(
    post,
    path = "/api/doctors",
    request_body = DoctorRequest,
    responses(
        (status = 201, description = "Doctor created", body = MessageResponse),
        (status = 400, description = "Missing field"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn create_doctor(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<DoctorRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let doctor = NewDoctor {
        fname: require(&payload.fname, "fname")?,
        lname: require(&payload.lname, "lname")?,
        department: require(&payload.department, "department")?,
        description: payload.description.clone().unwrap_or_default(),
        timeranges: payload.timeranges.clone().unwrap_or_default(),
        yoe: payload.yoe.unwrap_or(0),
    };

    state
        .repo
        .create_doctor(&doctor)
        .await
        .map_err(|_| ApiError::Storage("Failed to add doctor".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Doctor added successfully")),
    ))
}

/// update_doctor
///
/// [Admin Route] Overwrites every field of a doctor from the request body. This is
/// deliberately not a partial patch: an omitted field is written as its default
/// value, erasing whatever was stored before.
#[utoipa::path(
    put,
    path = "/api/doctors/{id}",
    request_body = DoctorRequest,
    responses(
        (status = 200, description = "Doctor updated", body = MessageResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn update_doctor(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DoctorRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .update_doctor(id, &payload)
        .await
        .map_err(|_| ApiError::Storage("Failed to update doctor".to_string()))?;
    // Zero affected rows (unknown id) still reports success; only a storage
    // failure is an error. See DESIGN.md.
    Ok(Json(MessageResponse::new("Doctor updated successfully")))
}

/// delete_doctor
///
/// [Admin Route] Deletes a doctor unconditionally. Existing appointments keep
/// their doctorid and simply drop out of joined listings; deleting an unknown id
/// reports success.
#[utoipa::path(
    delete,
    path = "/api/doctors/{id}",
    responses(
        (status = 200, description = "Doctor deleted", body = MessageResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn delete_doctor(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .delete_doctor(id)
        .await
        .map_err(|_| ApiError::Storage("Failed to delete doctor".to_string()))?;
    Ok(Json(MessageResponse::new("Doctor deleted successfully")))
}

// --- Appointments ---

/// list_appointments
///
/// [User or Admin Route] The admin sees every appointment with patient and doctor
/// identity joined; a patient sees only their own, with doctor identity joined.
/// Both are newest-first. Anonymous callers get 401.
#[utoipa::path(
    get,
    path = "/api/appointments",
    responses(
        (status = 200, description = "Appointments (scope depends on role)", body = [AppointmentOverview]),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_appointments(
    Session(identity): Session,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    match identity {
        Identity::Admin => {
            let appointments: Vec<AppointmentOverview> = state
                .repo
                .list_all_appointments()
                .await
                .map_err(|_| ApiError::Storage("Failed to load appointments".to_string()))?;
            Ok(Json(appointments).into_response())
        }
        Identity::User { id, .. } => {
            let appointments: Vec<AppointmentWithDoctor> = state
                .repo
                .list_patient_appointments(id)
                .await
                .map_err(|_| ApiError::Storage("Failed to load appointments".to_string()))?;
            Ok(Json(appointments).into_response())
        }
        Identity::Anonymous => Err(ApiError::Authentication(
            "Authentication required".to_string(),
        )),
    }
}

/// book_appointment
///
/// [User Route] Books a slot for the logged-in patient. The availability pre-check
/// only considers non-cancelled appointments, so a cancelled slot can be rebooked.
/// The check and the insert are two statements; see DESIGN.md for the race this
/// leaves open.
#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = MessageResponse),
        (status = 400, description = "Missing field or slot already booked"),
        (status = 401, description = "User login required")
    )
)]
pub async fn book_appointment(
    Session(identity): Session,
    State(state): State<AppState>,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    // Admin sessions carry no patient id, so they cannot book either.
    let Identity::User { id: patient_id, .. } = identity else {
        return Err(ApiError::Authentication("User login required".to_string()));
    };

    let time = payload.time.as_deref().filter(|t| !t.is_empty());
    let (Some(doctorid), Some(time)) = (payload.doctorid, time) else {
        return Err(ApiError::Validation(
            "Doctor ID and time are required".to_string(),
        ));
    };

    if state
        .repo
        .slot_taken(doctorid, time)
        .await
        .map_err(|_| ApiError::Storage("Failed to book appointment".to_string()))?
    {
        return Err(ApiError::Conflict("Time slot is already booked".to_string()));
    }

    state
        .repo
        .book_appointment(patient_id, doctorid, time)
        .await
        .map_err(|_| ApiError::Storage("Failed to book appointment".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Appointment booked successfully")),
    ))
}

/// update_appointment
///
/// [Admin Route] Overwrites both status flags of an appointment. Absent flags are
/// written as false, so an empty body resets the appointment; this is the only
/// mutation appointments ever receive (they are never deleted).
#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    request_body = AppointmentStatusRequest,
    responses(
        (status = 200, description = "Appointment updated", body = MessageResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn update_appointment(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AppointmentStatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .set_appointment_status(id, payload.completed, payload.cancelled)
        .await
        .map_err(|_| ApiError::Storage("Failed to update appointment".to_string()))?;
    Ok(Json(MessageResponse::new("Appointment updated successfully")))
}

// --- Users ---

/// list_users
///
/// [Admin Route] Lists every registered patient ordered by name. The password
/// column is not even selected by the repository query.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, passwords excluded", body = [User]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .repo
        .list_users()
        .await
        .map_err(|_| ApiError::Storage("Failed to load users".to_string()))?;
    Ok(Json(users))
}

// --- Health ---

/// health_check
///
/// [Public Route] Liveness probe with a fixed payload. Intentionally does not
/// touch the database: it answers "is the process up", nothing more.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Hospital Booking API is running".to_string(),
    })
}
