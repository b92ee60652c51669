use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A patient's canonical identity record from the `users` table. The stored password
/// is compared verbatim on login (reproduced from the system this replaces, see
/// DESIGN.md) and is excluded from every serialized response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub fname: String,
    pub lname: String,
    pub age: Option<i32>,
    pub email: String,
    pub phone: Option<String>,
    /// Never serialized; admin listing queries do not even select this column.
    #[serde(skip)]
    #[sqlx(default)]
    pub password: String,
    #[serde(rename = "createdAt")]
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserSummary
///
/// The identity subset exposed on login and `GET /api/user`:
/// id, names and email, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserSummary {
    pub id: i64,
    pub fname: String,
    pub lname: String,
    pub email: String,
}

/// Doctor
///
/// A doctor record from the `doctors` table. `fname`, `lname` and `department` are
/// nullable because the admin update endpoint has full-overwrite semantics: a PUT
/// that omits a field writes its absent value, so a row can legitimately end up
/// with nulls in these columns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Doctor {
    pub id: i64,
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub department: Option<String>,
    pub description: String,
    /// Free-text description of the doctor's available time ranges. This is display
    /// text only; booking never parses it.
    pub timeranges: String,
    /// Years of experience.
    pub yoe: i32,
}

/// Appointment
///
/// A booking record from the `appointments` table. `time` is an opaque string with
/// no canonical timezone; slot conflicts are exact string equality on
/// (doctorid, time). Appointments are never physically deleted, only flagged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Appointment {
    pub id: i64,
    pub patientid: i64,
    pub doctorid: i64,
    pub time: String,
    pub completed: bool,
    pub cancelled: bool,
}

/// AppointmentWithDoctor
///
/// A patient-scope appointment listing row: the appointment joined with the
/// doctor's identity fields. The doctor fields are nullable because the doctor
/// columns themselves are (full-overwrite updates can write nulls there).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AppointmentWithDoctor {
    pub id: i64,
    pub patientid: i64,
    pub doctorid: i64,
    pub time: String,
    pub completed: bool,
    pub cancelled: bool,
    pub doctor_fname: Option<String>,
    pub doctor_lname: Option<String>,
    pub department: Option<String>,
}

/// AppointmentOverview
///
/// The admin-scope appointment listing row: the appointment joined with both the
/// patient's and the doctor's identity fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AppointmentOverview {
    pub id: i64,
    pub patientid: i64,
    pub doctorid: i64,
    pub time: String,
    pub completed: bool,
    pub cancelled: bool,
    pub patient_fname: String,
    pub patient_lname: String,
    pub patient_email: String,
    pub doctor_fname: Option<String>,
    pub doctor_lname: Option<String>,
    pub department: Option<String>,
}

// --- Validated Insert Records (Internal) ---

/// NewUser
///
/// A registration payload after handler validation: the required fields are
/// guaranteed non-empty by the time the repository sees this.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fname: String,
    pub lname: String,
    pub age: Option<i32>,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// NewDoctor
///
/// A doctor-creation payload after handler validation, with the optional fields
/// already defaulted (empty strings, zero years of experience).
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub fname: String,
    pub lname: String,
    pub department: String,
    pub description: String,
    pub timeranges: String,
    pub yoe: i32,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for `POST /api/register`. Every field is optional at the serde
/// level so the handler can report the first missing required field itself instead
/// of bubbling a deserialization error; empty strings count as missing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// LoginRequest
///
/// Input payload for `POST /api/login` and `POST /api/admin/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// DoctorRequest
///
/// Input payload for both `POST /api/doctors` and `PUT /api/doctors/{id}`.
/// Create validates fname/lname/department; update applies all fields
/// unconditionally (full overwrite, omitted fields become their defaults).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DoctorRequest {
    pub fname: Option<String>,
    pub lname: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub timeranges: Option<String>,
    pub yoe: Option<i32>,
}

/// BookAppointmentRequest
///
/// Input payload for `POST /api/appointments`. The patient id is never accepted
/// from the client; it always comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BookAppointmentRequest {
    pub doctorid: Option<i64>,
    pub time: Option<String>,
}

/// AppointmentStatusRequest
///
/// Input payload for `PUT /api/appointments/{id}`. Both flags default to false when
/// absent and are written unconditionally: sending an empty body resets the
/// appointment to not-completed, not-cancelled. This is an overwrite, not a patch.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AppointmentStatusRequest {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub cancelled: bool,
}

// --- Response Schemas (Output) ---

/// MessageResponse
///
/// The `{"message": ...}` success envelope used by all write endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// LoginResponse
///
/// Output schema for a successful user login: a message plus the identity subset
/// the frontend caches in its auth context.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
}

/// HealthResponse
///
/// The fixed payload of the liveness probe. Deliberately checks nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
