use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountSummary;
use super::assignment::AssignmentResponse;
use super::shared::{Pagination, validate_name};
use crate::entity::team;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    #[schema(example = "Math 101")]
    pub name: String,
    /// Unique join code students use to self-enroll.
    #[schema(example = "ABC123")]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

pub fn validate_create_team(payload: &CreateTeamRequest) -> Result<(), AppError> {
    validate_name(&payload.name, "Name")?;
    validate_team_code(&payload.code)
}

pub fn validate_team_code(code: &str) -> Result<(), AppError> {
    let code = code.trim();
    if code.is_empty() || code.chars().count() > 32 {
        return Err(AppError::Validation(
            "Team code must be 1-32 characters".into(),
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::Validation(
            "Team code must contain only letters, digits, and dashes".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn validate_update_team(payload: &UpdateTeamRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name, "Name")?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct TeamListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive name substring filter.
    pub search: Option<String>,
}

/// Request body for a student joining a team by its code.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct JoinTeamRequest {
    #[schema(example = "ABC123")]
    pub code: String,
}

/// Request body for a teacher adding a student to a team by SAP ID.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddMemberRequest {
    #[schema(example = 60004123)]
    pub sapid: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: String,
    pub teacher_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<team::Model> for TeamResponse {
    fn from(m: team::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            description: m.description,
            teacher_id: m.teacher_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamListResponse {
    pub data: Vec<TeamResponse>,
    pub pagination: Pagination,
}

/// Full team view: owning teacher, enrolled members, assignments.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamDetailResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: String,
    pub teacher: AccountSummary,
    pub members: Vec<AccountSummary>,
    pub assignments: Vec<AssignmentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamMemberResponse {
    pub team_id: i32,
    pub student_id: i32,
    pub username: String,
    pub sapid: i32,
    pub joined_at: DateTime<Utc>,
}
