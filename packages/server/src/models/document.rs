use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::document;
use crate::error::AppError;

/// The single owning parent of a document.
///
/// Three nullable foreign keys back this in the schema; exactly one must
/// be set, and this type is the only way upload handlers can express a
/// parent, so the invariant holds for every row the server writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentParent {
    Assignment(i32),
    Submission(i32),
    QuestionGeneration(i32),
}

impl DocumentParent {
    /// Resolve the parent from the three optional id fields of an upload
    /// request. Zero or more than one set is a validation error.
    pub fn resolve(
        assignment_id: Option<i32>,
        submission_id: Option<i32>,
        question_generation_id: Option<i32>,
    ) -> Result<Self, AppError> {
        match (assignment_id, submission_id, question_generation_id) {
            (Some(id), None, None) => Ok(Self::Assignment(id)),
            (None, Some(id), None) => Ok(Self::Submission(id)),
            (None, None, Some(id)) => Ok(Self::QuestionGeneration(id)),
            (None, None, None) => Err(AppError::Validation(
                "Provide one of assignment_id, submission_id, or question_generation_id".into(),
            )),
            _ => Err(AppError::Validation(
                "Provide exactly one of assignment_id, submission_id, or question_generation_id"
                    .into(),
            )),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    /// Download URL served by this API.
    #[schema(example = "/api/v1/documents/0190a3c4-.../download")]
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub assignment_id: Option<i32>,
    pub submission_id: Option<i32>,
    pub question_generation_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<document::Model> for DocumentResponse {
    fn from(m: document::Model) -> Self {
        Self {
            url: format!("/api/v1/documents/{}/download", m.id),
            id: m.id,
            filename: m.filename,
            content_type: m.content_type,
            size: m.size,
            assignment_id: m.assignment_id,
            submission_id: m.submission_id,
            question_generation_id: m.question_generation_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentUploadResponse {
    pub documents: Vec<DocumentResponse>,
}
