use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentResponse;
use super::shared::validate_name;
use crate::entity::question_generation;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQuestionGenerationRequest {
    #[schema(example = "Midterm draft")]
    pub name: String,
}

pub fn validate_create_question_generation(
    payload: &CreateQuestionGenerationRequest,
) -> Result<(), AppError> {
    validate_name(&payload.name, "Name")
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateQuestionGenerationRequest {
    pub name: Option<String>,
}

pub fn validate_update_question_generation(
    payload: &UpdateQuestionGenerationRequest,
) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_name(name, "Name")?;
    }
    Ok(())
}

/// Body for storing the generated question paper.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct StoreOutputRequest {
    /// Generated question JSON, stored verbatim.
    pub output: serde_json::Value,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestionGenerationResponse {
    pub id: i32,
    pub name: String,
    pub teacher_id: i32,
    /// NULL until generation completes.
    pub output: Option<serde_json::Value>,
    pub documents: Vec<DocumentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuestionGenerationResponse {
    pub fn from_model(m: question_generation::Model, documents: Vec<DocumentResponse>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            teacher_id: m.teacher_id,
            output: m.output,
            documents,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
