use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentResponse;
use crate::entity::submission;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubmissionRequest {
    /// Free-text answer or cover note.
    #[serde(default)]
    pub description: String,
}

/// Partial update. Students may change `description`; marks and remarks
/// are reserved for the assignment's teacher.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSubmissionRequest {
    pub description: Option<String>,
    pub marks: Option<i32>,
    pub remarks: Option<String>,
}

pub fn validate_update_submission(payload: &UpdateSubmissionRequest) -> Result<(), AppError> {
    if let Some(marks) = payload.marks
        && marks < 0
    {
        return Err(AppError::Validation("Marks must be >= 0".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub description: String,
    pub marks: Option<i32>,
    pub remarks: Option<String>,
    pub student_id: i32,
    pub assignment_id: i32,
    pub documents: Vec<DocumentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionResponse {
    pub fn from_model(m: submission::Model, documents: Vec<DocumentResponse>) -> Self {
        Self {
            id: m.id,
            description: m.description,
            marks: m.marks,
            remarks: m.remarks,
            student_id: m.student_id,
            assignment_id: m.assignment_id,
            documents,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Teacher-facing list row with the submitting student inlined.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionListItem {
    pub id: i32,
    pub student_id: i32,
    pub student_username: String,
    pub student_sapid: i32,
    pub description: String,
    pub marks: Option<i32>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
