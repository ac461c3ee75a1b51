use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{document, question_generation};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthTeacher;
use crate::extractors::json::AppJson;
use crate::models::document::DocumentResponse;
use crate::models::question_generation::*;
use crate::state::AppState;
use crate::utils::cascade;

/// Create a question-generation batch owned by the calling teacher.
#[utoipa::path(
    post,
    path = "/",
    tag = "Question Generations",
    operation_id = "createQuestionGeneration",
    summary = "Create a question-generation batch",
    request_body = CreateQuestionGenerationRequest,
    responses(
        (status = 201, description = "Batch created", body = QuestionGenerationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, name = %payload.name))]
pub async fn create_question_generation(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateQuestionGenerationRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_question_generation(&payload)?;

    let now = chrono::Utc::now();
    let new_qg = question_generation::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        teacher_id: Set(caller.id),
        output: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_qg.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(QuestionGenerationResponse::from_model(model, vec![])),
    ))
}

/// The calling teacher's batches, newest first, with their documents.
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Question Generations",
    operation_id = "listMyQuestionGenerations",
    summary = "List own question-generation batches",
    responses(
        (status = 200, description = "Batches", body = Vec<QuestionGenerationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id))]
pub async fn list_my_question_generations(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionGenerationResponse>>, AppError> {
    let batches = question_generation::Entity::find()
        .filter(question_generation::Column::TeacherId.eq(caller.id))
        .order_by_desc(question_generation::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(batches.len());
    for model in batches {
        let documents = documents_for(&state.db, model.id).await?;
        data.push(QuestionGenerationResponse::from_model(model, documents));
    }

    Ok(Json(data))
}

/// Get a batch with its documents. Owning teacher only.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Question Generations",
    operation_id = "getQuestionGeneration",
    summary = "Get a question-generation batch",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch", body = QuestionGenerationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id, id))]
pub async fn get_question_generation(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<QuestionGenerationResponse>, AppError> {
    let model = find_question_generation(&state.db, id).await?;
    require_owner(&model, caller.id)?;

    let documents = documents_for(&state.db, model.id).await?;
    Ok(Json(QuestionGenerationResponse::from_model(
        model, documents,
    )))
}

/// Rename a batch. Owning teacher only.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Question Generations",
    operation_id = "updateQuestionGeneration",
    summary = "Rename a question-generation batch",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = UpdateQuestionGenerationRequest,
    responses(
        (status = 200, description = "Batch updated", body = QuestionGenerationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, id))]
pub async fn update_question_generation(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateQuestionGenerationRequest>,
) -> Result<Json<QuestionGenerationResponse>, AppError> {
    validate_update_question_generation(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_question_generation_for_update(&txn, id).await?;
    require_owner(&existing, caller.id)?;

    if payload == UpdateQuestionGenerationRequest::default() {
        let documents = documents_for(&txn, existing.id).await?;
        return Ok(Json(QuestionGenerationResponse::from_model(
            existing, documents,
        )));
    }

    let mut active: question_generation::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    let documents = documents_for(&txn, model.id).await?;
    txn.commit().await?;

    Ok(Json(QuestionGenerationResponse::from_model(
        model, documents,
    )))
}

/// Store the generated question-paper output for a batch.
#[utoipa::path(
    put,
    path = "/{id}/output",
    tag = "Question Generations",
    operation_id = "storeQuestionGenerationOutput",
    summary = "Store generated output",
    description = "Stores the generated question JSON verbatim. Restricted to the owning teacher.",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = StoreOutputRequest,
    responses(
        (status = 200, description = "Output stored", body = QuestionGenerationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, id))]
pub async fn store_output(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<StoreOutputRequest>,
) -> Result<Json<QuestionGenerationResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_question_generation_for_update(&txn, id).await?;
    require_owner(&existing, caller.id)?;

    let mut active: question_generation::ActiveModel = existing.into();
    active.output = Set(Some(payload.output));
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    let documents = documents_for(&txn, model.id).await?;
    txn.commit().await?;

    Ok(Json(QuestionGenerationResponse::from_model(
        model, documents,
    )))
}

/// Delete a batch and its document rows. Owning teacher only.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Question Generations",
    operation_id = "deleteQuestionGeneration",
    summary = "Delete a question-generation batch",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id, id))]
pub async fn delete_question_generation(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_question_generation_for_update(&txn, id).await?;
    require_owner(&existing, caller.id)?;

    cascade::delete_question_generation_cascade(&txn, id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

fn require_owner(model: &question_generation::Model, teacher_id: i32) -> Result<(), AppError> {
    if model.teacher_id == teacher_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

pub(crate) async fn find_question_generation<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<question_generation::Model, AppError> {
    question_generation::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question generation not found".into()))
}

async fn find_question_generation_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<question_generation::Model, AppError> {
    question_generation::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Question generation not found".into()))
}

async fn documents_for<C: ConnectionTrait>(
    db: &C,
    question_generation_id: i32,
) -> Result<Vec<DocumentResponse>, AppError> {
    let docs = document::Entity::find()
        .filter(document::Column::QuestionGenerationId.eq(question_generation_id))
        .order_by_asc(document::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();
    Ok(docs)
}
