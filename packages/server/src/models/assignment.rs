use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentResponse;
use super::shared::{Pagination, validate_name};
use crate::entity::assignment;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    #[schema(example = "Problem Set 3")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Submissions are rejected after this instant.
    pub deadline: DateTime<Utc>,
    pub team_id: i32,
}

pub fn validate_create_assignment(payload: &CreateAssignmentRequest) -> Result<(), AppError> {
    validate_name(&payload.name, "Name")
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAssignmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

pub fn validate_update_assignment(payload: &UpdateAssignmentRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name, "Name")?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub team_id: i32,
    pub teacher_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<assignment::Model> for AssignmentResponse {
    fn from(m: assignment::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            deadline: m.deadline,
            team_id: m.team_id,
            teacher_id: m.teacher_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Assignment with its attached documents.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentDetailResponse {
    #[serde(flatten)]
    pub assignment: AssignmentResponse,
    pub documents: Vec<DocumentResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentListResponse {
    pub data: Vec<AssignmentResponse>,
    pub pagination: Pagination,
}
