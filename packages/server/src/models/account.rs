//! Request/response shapes shared by the student and teacher controllers,
//! which are structurally identical over their disjoint credential stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{student, teacher};
use crate::error::AppError;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Institutional numeric identifier (SAP ID), used for login.
    #[schema(example = 60004123)]
    pub sapid: i32,
    /// Display name (1-64 chars).
    #[schema(example = "rhea_k")]
    pub username: String,
    /// Unique email address.
    #[schema(example = "rhea@example.edu")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Free-text profile description.
    #[serde(default)]
    pub description: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    if payload.sapid <= 0 {
        return Err(AppError::Validation("SAP ID must be positive".into()));
    }
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "Username must be 1-64 characters".into(),
        ));
    }
    let email = payload.email.trim();
    if !email.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for login. Accounts log in with their SAP ID, not email.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = 60004123)]
    pub sapid: i32,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.sapid <= 0 {
        return Err(AppError::Validation("SAP ID must be positive".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref username) = payload.username {
        let username = username.trim();
        if username.is_empty() || username.chars().count() > 64 {
            return Err(AppError::Validation(
                "Username must be 1-64 characters".into(),
            ));
        }
    }
    if let Some(ref email) = payload.email {
        let email = email.trim();
        if !email.contains('@') || email.chars().any(char::is_whitespace) {
            return Err(AppError::Validation("Invalid email address".into()));
        }
    }
    Ok(())
}

/// Query parameters for account search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive username substring, or an exact SAP ID when numeric.
    pub q: String,
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token; lifetime is the configured token TTL.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Row id of the authenticated account.
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "rhea_k")]
    pub username: String,
    /// "student" or "teacher".
    #[schema(example = "student")]
    pub role: &'static str,
}

/// An account profile. The password hash is never serialized.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub sapid: i32,
    pub username: String,
    pub email: String,
    pub description: String,
    /// Profile picture URL, if one has been uploaded.
    pub pfp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountResponse {
    pub fn from_student(m: student::Model) -> Self {
        let pfp = m
            .avatar_hash
            .as_ref()
            .map(|_| format!("/api/v1/students/{}/avatar", m.id));
        Self {
            id: m.id,
            sapid: m.sapid,
            username: m.username,
            email: m.email,
            description: m.description,
            pfp,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    pub fn from_teacher(m: teacher::Model) -> Self {
        let pfp = m
            .avatar_hash
            .as_ref()
            .map(|_| format!("/api/v1/teachers/{}/avatar", m.id));
        Self {
            id: m.id,
            sapid: m.sapid,
            username: m.username,
            email: m.email,
            description: m.description,
            pfp,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Paginated account listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccountListResponse {
    pub data: Vec<AccountResponse>,
    pub pagination: super::shared::Pagination,
}

/// Compact account reference nested inside other resources.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccountSummary {
    pub id: i32,
    pub sapid: i32,
    pub username: String,
    pub email: String,
}

impl From<student::Model> for AccountSummary {
    fn from(m: student::Model) -> Self {
        Self {
            id: m.id,
            sapid: m.sapid,
            username: m.username,
            email: m.email,
        }
    }
}

impl From<teacher::Model> for AccountSummary {
    fn from(m: teacher::Model) -> Self {
        Self {
            id: m.id,
            sapid: m.sapid,
            username: m.username,
            email: m.email,
        }
    }
}
