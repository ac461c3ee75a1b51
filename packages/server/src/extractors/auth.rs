use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use sea_orm::EntityTrait;

use crate::entity::{student, teacher};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// An authenticated account: either a student or a teacher.
///
/// The two credential stores are disjoint and their ids are store-scoped,
/// so resolution is keyed by the token's `(role, uid)` pair — a student
/// token can never resolve to a teacher record even when the numeric ids
/// collide.
pub enum Identity {
    Student(student::Model),
    Teacher(teacher::Model),
}

impl Identity {
    pub fn role(&self) -> &'static str {
        match self {
            Identity::Student(_) => "student",
            Identity::Teacher(_) => "teacher",
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Identity::Student(s) => s.id,
            Identity::Teacher(t) => t.id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Identity::Student(s) => &s.username,
            Identity::Teacher(t) => &t.username,
        }
    }
}

/// Extractor for any authenticated account.
///
/// Add this as a handler parameter to require a valid bearer token.
pub struct AuthIdentity(pub Identity);

/// Extractor requiring the caller to be a student.
pub struct AuthStudent(pub student::Model);

/// Extractor requiring the caller to be a teacher.
pub struct AuthTeacher(pub teacher::Model);

async fn resolve_identity(parts: &Parts, state: &AppState) -> Result<Identity, AppError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;

    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    match claims.role.as_str() {
        "student" => {
            let model = student::Entity::find_by_id(claims.uid)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Account not found".into()))?;
            Ok(Identity::Student(model))
        }
        "teacher" => {
            let model = teacher::Entity::find_by_id(claims.uid)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Account not found".into()))?;
            Ok(Identity::Teacher(model))
        }
        _ => Err(AppError::TokenInvalid),
    }
}

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(AuthIdentity(resolve_identity(parts, &state).await?))
    }
}

impl<S> FromRequestParts<S> for AuthStudent
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match resolve_identity(parts, &state).await? {
            Identity::Student(model) => Ok(AuthStudent(model)),
            Identity::Teacher(_) => Err(AppError::PermissionDenied),
        }
    }
}

impl<S> FromRequestParts<S> for AuthTeacher
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match resolve_identity(parts, &state).await? {
            Identity::Teacher(model) => Ok(AuthTeacher(model)),
            Identity::Student(_) => Err(AppError::PermissionDenied),
        }
    }
}
