use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use uuid::Uuid;

use crate::error::ApiError;

/// Name of the opaque session cookie. The value is a random UUID; nothing about the
/// identity is stored client-side.
pub const SESSION_COOKIE: &str = "hospital_session";

/// Identity
///
/// The resolved identity of a request context. A session holds exactly one of the
/// non-anonymous variants; there is no role hierarchy, so an admin session does not
/// satisfy user-only checks and a user session does not satisfy admin-only checks.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User { id: i64, email: String },
    Admin,
}

/// SessionStore
///
/// The server-side session table: opaque token -> identity. This is the only shared
/// mutable state in the process. Entries live until logout (or a re-login through
/// the same cookie) removes them; a process restart logs everyone out.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Identity>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an identity under a fresh random token and returns the token.
    pub fn insert(&self, identity: Identity) -> Uuid {
        let token = Uuid::new_v4();
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(token, identity);
        token
    }

    pub fn get(&self, token: &Uuid) -> Option<Identity> {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .get(token)
            .cloned()
    }

    /// Removes a session. Removing an unknown token is a no-op, which keeps logout
    /// idempotent.
    pub fn remove(&self, token: &Uuid) {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .remove(token);
    }
}

// --- Cookie plumbing ---

/// Builds the Set-Cookie value for a fresh login. HttpOnly keeps the token away
/// from frontend scripts; Lax is sufficient for the localhost frontend/API split.
pub fn session_cookie(token: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Builds the removal cookie for logout. The path must match `session_cookie` or
/// browsers will not drop the original.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Extracts and parses the session token from a request's cookies.
pub fn session_token(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn resolve_identity(parts: &Parts, store: &SessionStore) -> Identity {
    let jar = CookieJar::from_headers(&parts.headers);
    session_token(&jar)
        .and_then(|token| store.get(&token))
        .unwrap_or(Identity::Anonymous)
}

// --- Extractors ---

/// Session
///
/// Infallible extractor yielding the request's `Identity`, anonymous included. Used
/// by the handlers whose behavior branches on the role (appointment listing) or
/// whose unauthenticated error message differs from the shared extractors below.
pub struct Session(pub Identity);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        Ok(Session(resolve_identity(parts, &store)))
    }
}

/// AuthUser
///
/// Extractor for user-only endpoints. Rejects with 401 unless the session belongs
/// to a logged-in patient; an admin session is explicitly not accepted here.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        match resolve_identity(parts, &store) {
            Identity::User { id, email } => Ok(AuthUser { id, email }),
            _ => Err(ApiError::Authentication("Not authenticated".to_string())),
        }
    }
}

/// AdminUser
///
/// Extractor for admin-only endpoints. Rejects with 403 unless the session carries
/// the admin identity; a user session is not enough.
#[derive(Debug, Clone)]
pub struct AdminUser;

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        match resolve_identity(parts, &store) {
            Identity::Admin => Ok(AdminUser),
            _ => Err(ApiError::Authorization("Admin access required".to_string())),
        }
    }
}
