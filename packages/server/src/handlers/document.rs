use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{document, student, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, Identity};
use crate::handlers::assignment::find_assignment;
use crate::handlers::question_generation::find_question_generation;
use crate::handlers::submission::find_submission;
use crate::models::document::{DocumentParent, DocumentResponse, DocumentUploadResponse};
use crate::state::AppState;
use crate::utils::upload::{
    DOCUMENT_CONTENT_TYPES, ensure_allowed_type, map_storage_error, read_file_field, stream_blob,
};

/// Upload one or more files and attach them to a single parent.
///
/// Multipart fields: repeated `file` parts, plus exactly one of
/// `assignment_id`, `submission_id`, `question_generation_id` as a text
/// field. The caller must be authorized over the parent.
#[utoipa::path(
    post,
    path = "/",
    tag = "Documents",
    operation_id = "uploadDocuments",
    summary = "Upload documents",
    request_body(content_type = "multipart/form-data", description = "One or more `file` parts plus exactly one parent id field"),
    responses(
        (status = 201, description = "Documents stored", body = DocumentUploadResponse),
        (status = 400, description = "No files, bad parent selection, or unsupported type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not authorized over the parent (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Parent not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, multipart), fields(role = auth.0.role(), caller_id = auth.0.id()))]
pub async fn upload_documents(
    auth: AuthIdentity,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut files = Vec::new();
    let mut assignment_id = None;
    let mut submission_id = None;
    let mut question_generation_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") | Some("documents") => files.push(read_file_field(field).await?),
            Some("assignment_id") => assignment_id = Some(parse_id_field(field).await?),
            Some("submission_id") => submission_id = Some(parse_id_field(field).await?),
            Some("question_generation_id") => {
                question_generation_id = Some(parse_id_field(field).await?)
            }
            _ => {} // Ignore unknown fields.
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("No files were uploaded".into()));
    }
    for file in &files {
        ensure_allowed_type(file, DOCUMENT_CONTENT_TYPES)?;
    }

    let parent = DocumentParent::resolve(assignment_id, submission_id, question_generation_id)?;
    authorize_parent(&state.db, parent, &auth.0).await?;

    let (aid, sid, qid) = match parent {
        DocumentParent::Assignment(id) => (Some(id), None, None),
        DocumentParent::Submission(id) => (None, Some(id), None),
        DocumentParent::QuestionGeneration(id) => (None, None, Some(id)),
    };

    let mut created = Vec::with_capacity(files.len());
    for file in files {
        let hash = state
            .blob_store
            .put(&file.bytes)
            .await
            .map_err(map_storage_error)?;

        let model = document::ActiveModel {
            id: Set(Uuid::now_v7()),
            assignment_id: Set(aid),
            submission_id: Set(sid),
            question_generation_id: Set(qid),
            content_hash: Set(hash.to_hex()),
            filename: Set(file.filename),
            content_type: Set(file.content_type),
            size: Set(file.bytes.len() as i64),
            created_at: Set(Utc::now()),
        }
        .insert(&state.db)
        .await?;

        created.push(DocumentResponse::from(model));
    }

    Ok((
        StatusCode::CREATED,
        Json(DocumentUploadResponse { documents: created }),
    ))
}

/// Document metadata by ID.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Documents",
    operation_id = "getDocument",
    summary = "Get document metadata",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id = %id))]
pub async fn get_document(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let model = find_document(&state.db, id).await?;
    Ok(Json(DocumentResponse::from(model)))
}

/// Stream a document's bytes.
#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Documents",
    operation_id = "downloadDocument",
    summary = "Download a document",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id = %id))]
pub async fn download_document(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let model = find_document(&state.db, id).await?;
    stream_blob(
        &state,
        &model.content_hash,
        model.content_type.as_deref(),
        Some(&model.filename),
    )
    .await
}

/// Delete a document. The caller must be authorized over its parent.
/// The underlying blob is removed once nothing else references it.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Documents",
    operation_id = "deleteDocument",
    summary = "Delete a document",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not authorized over the parent (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Document not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(id = %id))]
pub async fn delete_document(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_document(&state.db, id).await?;

    let parent = DocumentParent::resolve(
        model.assignment_id,
        model.submission_id,
        model.question_generation_id,
    )
    .map_err(|_| AppError::Internal("Document row has no valid parent".into()))?;
    authorize_parent(&state.db, parent, &auth.0).await?;

    let content_hash = model.content_hash.clone();
    document::Entity::delete_by_id(id).exec(&state.db).await?;

    cleanup_blob_if_unreferenced(&state, &content_hash).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Verify the caller may attach to / detach from the given parent:
/// assignments and question generations belong to their teacher,
/// submissions to their student (or the assignment's teacher).
async fn authorize_parent<C: ConnectionTrait>(
    db: &C,
    parent: DocumentParent,
    identity: &Identity,
) -> Result<(), AppError> {
    match parent {
        DocumentParent::Assignment(id) => {
            let assignment_model = find_assignment(db, id).await?;
            match identity {
                Identity::Teacher(t) if t.id == assignment_model.teacher_id => Ok(()),
                _ => Err(AppError::PermissionDenied),
            }
        }
        DocumentParent::Submission(id) => {
            let submission_model = find_submission(db, id).await?;
            match identity {
                Identity::Student(s) if s.id == submission_model.student_id => Ok(()),
                Identity::Teacher(t) => {
                    let assignment_model =
                        find_assignment(db, submission_model.assignment_id).await?;
                    if assignment_model.teacher_id == t.id {
                        Ok(())
                    } else {
                        Err(AppError::PermissionDenied)
                    }
                }
                _ => Err(AppError::PermissionDenied),
            }
        }
        DocumentParent::QuestionGeneration(id) => {
            let qg_model = find_question_generation(db, id).await?;
            match identity {
                Identity::Teacher(t) if t.id == qg_model.teacher_id => Ok(()),
                _ => Err(AppError::PermissionDenied),
            }
        }
    }
}

/// Drop the blob when no document or avatar still references its hash.
/// Best-effort: a leftover blob is garbage, not corruption.
async fn cleanup_blob_if_unreferenced(state: &AppState, content_hash: &str) {
    let still_referenced = async {
        let docs = document::Entity::find()
            .filter(document::Column::ContentHash.eq(content_hash))
            .count(&state.db)
            .await?;
        if docs > 0 {
            return Ok::<bool, DbErr>(true);
        }
        let avatars = student::Entity::find()
            .filter(student::Column::AvatarHash.eq(content_hash))
            .count(&state.db)
            .await?
            + teacher::Entity::find()
                .filter(teacher::Column::AvatarHash.eq(content_hash))
                .count(&state.db)
                .await?;
        Ok(avatars > 0)
    }
    .await;

    match still_referenced {
        Ok(true) => {}
        Ok(false) => {
            if let Ok(hash) = common::storage::ContentHash::from_hex(content_hash)
                && let Err(e) = state.blob_store.delete(&hash).await
            {
                tracing::warn!("Failed to delete unreferenced blob {content_hash}: {e}");
            }
        }
        Err(e) => {
            tracing::warn!("Blob refcount query failed for {content_hash}: {e}");
        }
    }
}

async fn parse_id_field(field: axum::extract::multipart::Field<'_>) -> Result<i32, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    let text = field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
    text.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("'{name}' must be an integer")))
}

async fn find_document<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<document::Model, AppError> {
    document::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}
