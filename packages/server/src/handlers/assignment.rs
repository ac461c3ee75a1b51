use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, document};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, AuthTeacher};
use crate::extractors::json::AppJson;
use crate::handlers::team::{find_team, find_team_for_update};
use crate::models::assignment::*;
use crate::models::document::DocumentResponse;
use crate::models::shared::{ListQuery, Pagination};
use crate::state::AppState;
use crate::utils::cascade;

/// Create an assignment for a team the calling teacher owns.
#[utoipa::path(
    post,
    path = "/",
    tag = "Assignments",
    operation_id = "createAssignment",
    summary = "Create an assignment",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the team's teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, name = %payload.name))]
pub async fn create_assignment(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_assignment(&payload)?;

    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, payload.team_id).await?;
    if team_model.teacher_id != caller.id {
        return Err(AppError::PermissionDenied);
    }

    let now = chrono::Utc::now();
    let new_assignment = assignment::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        deadline: Set(payload.deadline),
        team_id: Set(payload.team_id),
        teacher_id: Set(caller.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_assignment.insert(&txn).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(model))))
}

/// List all assignments with pagination.
#[utoipa::path(
    get,
    path = "/",
    tag = "Assignments",
    operation_id = "listAssignments",
    summary = "List assignments",
    params(ListQuery),
    responses(
        (status = 200, description = "List of assignments", body = AssignmentListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_assignments(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let (page, per_page) = query.clamped();

    let select = assignment::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by_desc(assignment::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(AssignmentListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Assignments created by the calling teacher.
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Assignments",
    operation_id = "listMyAssignments",
    summary = "List own assignments",
    responses(
        (status = 200, description = "Assignments", body = Vec<AssignmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id))]
pub async fn list_my_assignments(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let data = assignment::Entity::find()
        .filter(assignment::Column::TeacherId.eq(caller.id))
        .order_by_desc(assignment::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(data))
}

/// Assignments of a team, oldest deadline first.
#[utoipa::path(
    get,
    path = "/{id}/assignments",
    tag = "Assignments",
    operation_id = "listTeamAssignments",
    summary = "List assignments for a team",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Assignments", body = Vec<AssignmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(team_id))]
pub async fn list_team_assignments(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    find_team(&state.db, team_id).await?;

    let data = assignment::Entity::find()
        .filter(assignment::Column::TeamId.eq(team_id))
        .order_by_asc(assignment::Column::Deadline)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(data))
}

/// Get an assignment with its attached documents.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "getAssignment",
    summary = "Get an assignment by ID",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = AssignmentDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id))]
pub async fn get_assignment(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AssignmentDetailResponse>, AppError> {
    let model = find_assignment(&state.db, id).await?;

    let documents = document::Entity::find()
        .filter(document::Column::AssignmentId.eq(id))
        .order_by_asc(document::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();

    Ok(Json(AssignmentDetailResponse {
        assignment: AssignmentResponse::from(model),
        documents,
    }))
}

/// Update an assignment. Owning teacher only.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "updateAssignment",
    summary = "Update an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, id))]
pub async fn update_assignment(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAssignmentRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    validate_update_assignment(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_assignment_for_update(&txn, id).await?;
    if existing.teacher_id != caller.id {
        return Err(AppError::PermissionDenied);
    }

    if payload == UpdateAssignmentRequest::default() {
        return Ok(Json(AssignmentResponse::from(existing)));
    }

    let mut active: assignment::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(deadline) = payload.deadline {
        active.deadline = Set(deadline);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(AssignmentResponse::from(model)))
}

/// Delete an assignment together with its submissions and documents.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Assignments",
    operation_id = "deleteAssignment",
    summary = "Delete an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id, id))]
pub async fn delete_assignment(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_assignment_for_update(&txn, id).await?;
    if existing.teacher_id != caller.id {
        return Err(AppError::PermissionDenied);
    }

    cascade::delete_assignment_cascade(&txn, id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_assignment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<assignment::Model, AppError> {
    assignment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}

pub(crate) async fn find_assignment_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<assignment::Model, AppError> {
    assignment::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}
