use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{document, student, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, AuthStudent, Identity};
use crate::extractors::json::AppJson;
use crate::handlers::assignment::{find_assignment, find_assignment_for_update};
use crate::handlers::team::is_team_member;
use crate::models::document::DocumentResponse;
use crate::models::submission::*;
use crate::state::AppState;
use crate::utils::cascade;

/// Submit work for an assignment.
///
/// The deadline check and the insert share a transaction holding a row
/// lock on the assignment, so a concurrent deadline change cannot slip a
/// submission past the cutoff.
#[utoipa::path(
    post,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "createSubmission",
    summary = "Submit work for an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Submission created", body = SubmissionResponse),
        (status = 400, description = "Deadline has passed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(student_id = caller.id, assignment_id))]
pub async fn create_submission(
    AuthStudent(caller): AuthStudent,
    State(state): State<AppState>,
    Path(assignment_id): Path<i32>,
    AppJson(payload): AppJson<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let assignment_model = find_assignment_for_update(&txn, assignment_id).await?;

    if !is_team_member(&txn, assignment_model.team_id, caller.id).await? {
        return Err(AppError::NotFound("Assignment not found".into())); // Prevent enumeration
    }

    let now = Utc::now();
    if now > assignment_model.deadline {
        return Err(AppError::Validation(
            "Deadline has passed. Submission not allowed.".into(),
        ));
    }

    let new_submission = submission::ActiveModel {
        description: Set(payload.description),
        marks: Set(None),
        remarks: Set(None),
        student_id: Set(caller.id),
        assignment_id: Set(assignment_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_submission.insert(&txn).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse::from_model(model, vec![])),
    ))
}

/// The calling student's submissions, newest first, with their documents.
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Submissions",
    operation_id = "listMySubmissions",
    summary = "List own submissions",
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(student_id = caller.id))]
pub async fn list_my_submissions(
    AuthStudent(caller): AuthStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let submissions = submission::Entity::find()
        .filter(submission::Column::StudentId.eq(caller.id))
        .order_by_desc(submission::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut documents = documents_by_submission(
        &state.db,
        submissions.iter().map(|s| s.id).collect::<Vec<_>>(),
    )
    .await?;

    let data = submissions
        .into_iter()
        .map(|s| {
            let docs = documents.remove(&s.id).unwrap_or_default();
            SubmissionResponse::from_model(s, docs)
        })
        .collect();

    Ok(Json(data))
}

/// All submissions for an assignment — the grading view, restricted to
/// the assignment's teacher.
#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "listAssignmentSubmissions",
    summary = "List submissions for an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the assignment's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(assignment_id))]
pub async fn list_assignment_submissions(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path(assignment_id): Path<i32>,
) -> Result<Json<Vec<SubmissionListItem>>, AppError> {
    let assignment_model = find_assignment(&state.db, assignment_id).await?;
    match auth.0 {
        Identity::Teacher(ref t) if t.id == assignment_model.teacher_id => {}
        _ => return Err(AppError::PermissionDenied),
    }

    let rows = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(assignment_id))
        .find_also_related(student::Entity)
        .order_by_asc(submission::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(|(sub, stu)| {
            let stu = stu.ok_or_else(|| AppError::Internal("Submission student missing".into()))?;
            Ok(SubmissionListItem {
                id: sub.id,
                student_id: sub.student_id,
                student_username: stu.username,
                student_sapid: stu.sapid,
                description: sub.description,
                marks: sub.marks,
                remarks: sub.remarks,
                created_at: sub.created_at,
                updated_at: sub.updated_at,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(data))
}

/// A student's most recent submission for an assignment. Visible to the
/// assignment's teacher and to the student themself.
#[utoipa::path(
    get,
    path = "/{id}/submissions/{student_id}",
    tag = "Submissions",
    operation_id = "getStudentSubmissionForAssignment",
    summary = "Get a student's submission for an assignment",
    params(
        ("id" = i32, Path, description = "Assignment ID"),
        ("student_id" = i32, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No submission found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(assignment_id, student_id))]
pub async fn get_student_submission(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path((assignment_id, student_id)): Path<(i32, i32)>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let assignment_model = find_assignment(&state.db, assignment_id).await?;

    let allowed = match auth.0 {
        Identity::Teacher(ref t) => t.id == assignment_model.teacher_id,
        Identity::Student(ref s) => s.id == student_id,
    };
    if !allowed {
        return Err(AppError::PermissionDenied);
    }

    let model = submission::Entity::find()
        .filter(submission::Column::AssignmentId.eq(assignment_id))
        .filter(submission::Column::StudentId.eq(student_id))
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    let documents = documents_for_submission(&state.db, model.id).await?;
    Ok(Json(SubmissionResponse::from_model(model, documents)))
}

/// Get a submission by ID. Owner student or the assignment's teacher.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get a submission by ID",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(submission_id = %id))]
pub async fn get_submission(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let model = find_submission(&state.db, id).await?;

    if !can_access(&state.db, &model, &auth.0).await? {
        return Err(AppError::NotFound("Submission not found".into())); // Prevent enumeration
    }

    let documents = documents_for_submission(&state.db, model.id).await?;
    Ok(Json(SubmissionResponse::from_model(model, documents)))
}

/// Update a submission. The owning student may edit the description; the
/// assignment's teacher may set marks and remarks. Either update bumps
/// `updated_at`.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Submissions",
    operation_id = "updateSubmission",
    summary = "Update a submission",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = UpdateSubmissionRequest,
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Field not editable by this role (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, payload), fields(submission_id = %id))]
pub async fn update_submission(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    validate_update_submission(&payload)?;

    let txn = state.db.begin().await?;
    let existing = submission::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    if !can_access(&txn, &existing, &auth.0).await? {
        return Err(AppError::NotFound("Submission not found".into()));
    }

    match auth.0 {
        Identity::Student(_) => {
            if payload.marks.is_some() || payload.remarks.is_some() {
                return Err(AppError::PermissionDenied);
            }
        }
        Identity::Teacher(_) => {
            if payload.description.is_some() {
                return Err(AppError::PermissionDenied);
            }
        }
    }

    if payload == UpdateSubmissionRequest::default() {
        let documents = documents_for_submission(&txn, existing.id).await?;
        return Ok(Json(SubmissionResponse::from_model(existing, documents)));
    }

    let mut active: submission::ActiveModel = existing.into();
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(marks) = payload.marks {
        active.marks = Set(Some(marks));
    }
    if let Some(remarks) = payload.remarks {
        active.remarks = Set(Some(remarks));
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    let documents = documents_for_submission(&txn, model.id).await?;
    txn.commit().await?;

    Ok(Json(SubmissionResponse::from_model(model, documents)))
}

/// Delete a submission. Owner student or the assignment's teacher.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Submissions",
    operation_id = "deleteSubmission",
    summary = "Delete a submission",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 204, description = "Submission deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(submission_id = %id))]
pub async fn delete_submission(
    auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = submission::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    if !can_access(&txn, &existing, &auth.0).await? {
        return Err(AppError::NotFound("Submission not found".into()));
    }

    cascade::delete_submission_cascade(&txn, id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Whether the caller owns the submission (student) or the assignment it
/// answers (teacher).
async fn can_access<C: ConnectionTrait>(
    db: &C,
    sub: &submission::Model,
    identity: &Identity,
) -> Result<bool, AppError> {
    match identity {
        Identity::Student(s) => Ok(s.id == sub.student_id),
        Identity::Teacher(t) => {
            let assignment_model = find_assignment(db, sub.assignment_id).await?;
            Ok(assignment_model.teacher_id == t.id)
        }
    }
}

pub(crate) async fn find_submission<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<submission::Model, AppError> {
    submission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

async fn documents_for_submission<C: ConnectionTrait>(
    db: &C,
    submission_id: i32,
) -> Result<Vec<DocumentResponse>, AppError> {
    let docs = document::Entity::find()
        .filter(document::Column::SubmissionId.eq(submission_id))
        .order_by_asc(document::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();
    Ok(docs)
}

async fn documents_by_submission<C: ConnectionTrait>(
    db: &C,
    submission_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<DocumentResponse>>, AppError> {
    let mut grouped: HashMap<i32, Vec<DocumentResponse>> = HashMap::new();
    if submission_ids.is_empty() {
        return Ok(grouped);
    }

    let docs = document::Entity::find()
        .filter(document::Column::SubmissionId.is_in(submission_ids))
        .order_by_asc(document::Column::CreatedAt)
        .all(db)
        .await?;

    for doc in docs {
        if let Some(sid) = doc.submission_id {
            grouped.entry(sid).or_default().push(DocumentResponse::from(doc));
        }
    }
    Ok(grouped)
}
