use crate::error::StorageError;
use crate::models::{
    Appointment, AppointmentOverview, AppointmentWithDoctor, Doctor, DoctorRequest, NewDoctor,
    NewUser, User, UserSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the concrete backend
/// (Postgres in production, the in-memory implementation in tests).
///
/// Error contract: every method returns `Err(StorageError)` only for a connection
/// or statement failure (already logged where it happened). "Nothing matched" is
/// always an `Ok` value — `Ok(None)`, `Ok(vec![])`, `Ok(false)` or `Ok(0)` — and
/// handlers must never confuse the two.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    /// Inserts a registration. The email duplicate check is a separate call
    /// (`email_exists`) issued by the handler first.
    async fn create_user(&self, user: &NewUser) -> Result<(), StorageError>;
    async fn email_exists(&self, email: &str) -> Result<bool, StorageError>;
    /// Exact plaintext credential match, by design of the system being reproduced.
    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserSummary>, StorageError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserSummary>, StorageError>;
    /// All users ordered by name, passwords never selected.
    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    // --- Doctors ---
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError>;
    async fn create_doctor(&self, doctor: &NewDoctor) -> Result<(), StorageError>;
    /// Full overwrite: every column is written from the request, omitted fields
    /// as their defaults. Returns the number of affected rows.
    async fn update_doctor(&self, id: i64, req: &DoctorRequest) -> Result<u64, StorageError>;
    /// Returns the number of affected rows; zero is not an error.
    async fn delete_doctor(&self, id: i64) -> Result<u64, StorageError>;

    // --- Appointments ---
    /// Admin scope: every appointment joined with patient and doctor identity,
    /// newest time first.
    async fn list_all_appointments(&self) -> Result<Vec<AppointmentOverview>, StorageError>;
    /// Patient scope: the patient's own appointments joined with doctor identity,
    /// newest time first.
    async fn list_patient_appointments(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError>;
    /// True if a non-cancelled appointment already occupies (doctorid, time).
    /// This check and the subsequent insert are two independent statements; the
    /// race between them is a documented limitation (see DESIGN.md).
    async fn slot_taken(&self, doctor_id: i64, time: &str) -> Result<bool, StorageError>;
    async fn book_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        time: &str,
    ) -> Result<(), StorageError>;
    /// Unconditionally overwrites both flags on the target appointment.
    async fn set_appointment_status(
        &self,
        id: i64,
        completed: bool,
        cancelled: bool,
    ) -> Result<u64, StorageError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of the `Repository` trait, backed by a PostgreSQL
/// connection pool. The runtime sqlx query API is used throughout so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: &NewUser) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO users (fname, lname, age, email, phone, password) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.fname)
        .bind(&user.lname)
        .bind(user.age)
        .bind(&user.email)
        .bind(user.phone.as_deref())
        .bind(&user.password)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create_user error: {:?}", e);
            StorageError
        })?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("email_exists error: {:?}", e);
                StorageError
            })?;
        Ok(row.is_some())
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserSummary>, StorageError> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, fname, lname, email FROM users WHERE email = $1 AND password = $2",
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("find_user_by_credentials error: {:?}", e);
            StorageError
        })
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserSummary>, StorageError> {
        sqlx::query_as::<_, UserSummary>("SELECT id, fname, lname, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("find_user_by_id error: {:?}", e);
                StorageError
            })
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        sqlx::query_as::<_, User>(
            "SELECT id, fname, lname, age, email, phone, created_at FROM users \
             ORDER BY fname, lname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("list_users error: {:?}", e);
            StorageError
        })
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        sqlx::query_as::<_, Doctor>(
            "SELECT id, fname, lname, department, description, timeranges, yoe FROM doctors \
             ORDER BY fname, lname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("list_doctors error: {:?}", e);
            StorageError
        })
    }

    async fn create_doctor(&self, doctor: &NewDoctor) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO doctors (fname, lname, department, description, timeranges, yoe) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&doctor.fname)
        .bind(&doctor.lname)
        .bind(&doctor.department)
        .bind(&doctor.description)
        .bind(&doctor.timeranges)
        .bind(doctor.yoe)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("create_doctor error: {:?}", e);
            StorageError
        })?;
        Ok(())
    }

    async fn update_doctor(&self, id: i64, req: &DoctorRequest) -> Result<u64, StorageError> {
        // Omitted fname/lname/department are written as NULL, omitted
        // description/timeranges/yoe as ''/0. Full overwrite, not a patch.
        let result = sqlx::query(
            "UPDATE doctors SET fname = $1, lname = $2, department = $3, description = $4, \
             timeranges = $5, yoe = $6 WHERE id = $7",
        )
        .bind(req.fname.as_deref())
        .bind(req.lname.as_deref())
        .bind(req.department.as_deref())
        .bind(req.description.as_deref().unwrap_or(""))
        .bind(req.timeranges.as_deref().unwrap_or(""))
        .bind(req.yoe.unwrap_or(0))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("update_doctor error: {:?}", e);
            StorageError
        })?;
        Ok(result.rows_affected())
    }

    async fn delete_doctor(&self, id: i64) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("delete_doctor error: {:?}", e);
                StorageError
            })?;
        Ok(result.rows_affected())
    }

    async fn list_all_appointments(&self) -> Result<Vec<AppointmentOverview>, StorageError> {
        // Inner join on doctors: an appointment whose doctor was deleted drops out
        // of the listing, matching the behavior being reproduced.
        sqlx::query_as::<_, AppointmentOverview>(
            r#"
            SELECT a.id, a.patientid, a.doctorid, a."time", a.completed, a.cancelled,
                   u.fname AS patient_fname, u.lname AS patient_lname, u.email AS patient_email,
                   d.fname AS doctor_fname, d.lname AS doctor_lname, d.department
            FROM appointments a
            JOIN users u ON a.patientid = u.id
            JOIN doctors d ON a.doctorid = d.id
            ORDER BY a."time" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("list_all_appointments error: {:?}", e);
            StorageError
        })
    }

    async fn list_patient_appointments(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError> {
        sqlx::query_as::<_, AppointmentWithDoctor>(
            r#"
            SELECT a.id, a.patientid, a.doctorid, a."time", a.completed, a.cancelled,
                   d.fname AS doctor_fname, d.lname AS doctor_lname, d.department
            FROM appointments a
            JOIN doctors d ON a.doctorid = d.id
            WHERE a.patientid = $1
            ORDER BY a."time" DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("list_patient_appointments error: {:?}", e);
            StorageError
        })
    }

    async fn slot_taken(&self, doctor_id: i64, time: &str) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r#"SELECT id FROM appointments WHERE doctorid = $1 AND "time" = $2 AND cancelled = FALSE"#,
        )
        .bind(doctor_id)
        .bind(time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("slot_taken error: {:?}", e);
            StorageError
        })?;
        Ok(row.is_some())
    }

    async fn book_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        time: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(r#"INSERT INTO appointments (patientid, doctorid, "time") VALUES ($1, $2, $3)"#)
            .bind(patient_id)
            .bind(doctor_id)
            .bind(time)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("book_appointment error: {:?}", e);
                StorageError
            })?;
        Ok(())
    }

    async fn set_appointment_status(
        &self,
        id: i64,
        completed: bool,
        cancelled: bool,
    ) -> Result<u64, StorageError> {
        let result =
            sqlx::query("UPDATE appointments SET completed = $1, cancelled = $2 WHERE id = $3")
                .bind(completed)
                .bind(cancelled)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("set_appointment_status error: {:?}", e);
                    StorageError
                })?;
        Ok(result.rows_affected())
    }
}

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait used by the integration
/// tests, so the full HTTP surface can be exercised without a Postgres instance.
/// It mirrors the Postgres implementation's observable behavior: the same
/// orderings, the same join semantics, the same rows-affected counts.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    doctors: Vec<Doctor>,
    appointments: Vec<Appointment>,
    next_user_id: i64,
    next_doctor_id: i64,
    next_appointment_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        fname: user.fname.clone(),
        lname: user.lname.clone(),
        email: user.email.clone(),
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: &NewUser) -> Result<(), StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.push(User {
            id,
            fname: user.fname.clone(),
            lname: user.lname.clone(),
            age: user.age,
            email: user.email.clone(),
            phone: user.phone.clone(),
            password: user.password.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        Ok(state.users.iter().any(|u| u.email == email))
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserSummary>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        Ok(state
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(summary))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserSummary>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        Ok(state.users.iter().find(|u| u.id == id).map(summary))
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        let mut users = state.users.clone();
        users.sort_by(|a, b| (&a.fname, &a.lname).cmp(&(&b.fname, &b.lname)));
        // The Postgres listing never selects the password column.
        for user in &mut users {
            user.password = String::new();
        }
        Ok(users)
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        let mut doctors = state.doctors.clone();
        doctors.sort_by(|a, b| (&a.fname, &a.lname).cmp(&(&b.fname, &b.lname)));
        Ok(doctors)
    }

    async fn create_doctor(&self, doctor: &NewDoctor) -> Result<(), StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        state.next_doctor_id += 1;
        let id = state.next_doctor_id;
        state.doctors.push(Doctor {
            id,
            fname: Some(doctor.fname.clone()),
            lname: Some(doctor.lname.clone()),
            department: Some(doctor.department.clone()),
            description: doctor.description.clone(),
            timeranges: doctor.timeranges.clone(),
            yoe: doctor.yoe,
        });
        Ok(())
    }

    async fn update_doctor(&self, id: i64, req: &DoctorRequest) -> Result<u64, StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        match state.doctors.iter_mut().find(|d| d.id == id) {
            Some(doctor) => {
                doctor.fname = req.fname.clone();
                doctor.lname = req.lname.clone();
                doctor.department = req.department.clone();
                doctor.description = req.description.clone().unwrap_or_default();
                doctor.timeranges = req.timeranges.clone().unwrap_or_default();
                doctor.yoe = req.yoe.unwrap_or(0);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_doctor(&self, id: i64) -> Result<u64, StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        let before = state.doctors.len();
        state.doctors.retain(|d| d.id != id);
        Ok((before - state.doctors.len()) as u64)
    }

    async fn list_all_appointments(&self) -> Result<Vec<AppointmentOverview>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        let mut rows: Vec<AppointmentOverview> = state
            .appointments
            .iter()
            .filter_map(|a| {
                // Inner-join semantics: both sides must still exist.
                let patient = state.users.iter().find(|u| u.id == a.patientid)?;
                let doctor = state.doctors.iter().find(|d| d.id == a.doctorid)?;
                Some(AppointmentOverview {
                    id: a.id,
                    patientid: a.patientid,
                    doctorid: a.doctorid,
                    time: a.time.clone(),
                    completed: a.completed,
                    cancelled: a.cancelled,
                    patient_fname: patient.fname.clone(),
                    patient_lname: patient.lname.clone(),
                    patient_email: patient.email.clone(),
                    doctor_fname: doctor.fname.clone(),
                    doctor_lname: doctor.lname.clone(),
                    department: doctor.department.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(rows)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: i64,
    ) -> Result<Vec<AppointmentWithDoctor>, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        let mut rows: Vec<AppointmentWithDoctor> = state
            .appointments
            .iter()
            .filter(|a| a.patientid == patient_id)
            .filter_map(|a| {
                let doctor = state.doctors.iter().find(|d| d.id == a.doctorid)?;
                Some(AppointmentWithDoctor {
                    id: a.id,
                    patientid: a.patientid,
                    doctorid: a.doctorid,
                    time: a.time.clone(),
                    completed: a.completed,
                    cancelled: a.cancelled,
                    doctor_fname: doctor.fname.clone(),
                    doctor_lname: doctor.lname.clone(),
                    department: doctor.department.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(rows)
    }

    async fn slot_taken(&self, doctor_id: i64, time: &str) -> Result<bool, StorageError> {
        let state = self.inner.lock().expect("memory repository lock poisoned");
        Ok(state
            .appointments
            .iter()
            .any(|a| a.doctorid == doctor_id && a.time == time && !a.cancelled))
    }

    async fn book_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        time: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        state.next_appointment_id += 1;
        let id = state.next_appointment_id;
        state.appointments.push(Appointment {
            id,
            patientid: patient_id,
            doctorid: doctor_id,
            time: time.to_string(),
            completed: false,
            cancelled: false,
        });
        Ok(())
    }

    async fn set_appointment_status(
        &self,
        id: i64,
        completed: bool,
        cancelled: bool,
    ) -> Result<u64, StorageError> {
        let mut state = self.inner.lock().expect("memory repository lock poisoned");
        match state.appointments.iter_mut().find(|a| a.id == id) {
            Some(appointment) => {
                appointment.completed = completed;
                appointment.cancelled = cancelled;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
