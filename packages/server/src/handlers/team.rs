use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{assignment, student, team, team_student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, AuthStudent, AuthTeacher, Identity};
use crate::extractors::json::AppJson;
use crate::handlers::teacher::find_teacher;
use crate::models::account::AccountSummary;
use crate::models::assignment::AssignmentResponse;
use crate::models::shared::{Pagination, escape_like};
use crate::models::team::*;
use crate::state::AppState;
use crate::utils::cascade;

/// Create a new team owned by the calling teacher.
#[utoipa::path(
    post,
    path = "/",
    tag = "Teams",
    operation_id = "createTeam",
    summary = "Create a team",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Team code already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, name = %payload.name))]
pub async fn create_team(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_team(&payload)?;

    let now = chrono::Utc::now();
    let new_team = team::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        code: Set(payload.code.trim().to_string()),
        description: Set(payload.description),
        teacher_id: Set(caller.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_team
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Team code already in use".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(model))))
}

/// List teams with pagination and optional name search.
#[utoipa::path(
    get,
    path = "/",
    tag = "Teams",
    operation_id = "listTeams",
    summary = "List teams",
    params(TeamListQuery),
    responses(
        (status = 200, description = "List of teams", body = TeamListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_teams(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<TeamListQuery>,
) -> Result<Json<TeamListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = team::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(team::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by_desc(team::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(TeamResponse::from)
        .collect();

    Ok(Json(TeamListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Teams the caller belongs to: joined teams for a student, owned teams
/// for a teacher.
#[utoipa::path(
    get,
    path = "/mine",
    tag = "Teams",
    operation_id = "listMyTeams",
    summary = "List own teams",
    responses(
        (status = 200, description = "Teams", body = Vec<TeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(role = auth.0.role(), id = auth.0.id()))]
pub async fn list_my_teams(
    auth: AuthIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    let data = match auth.0 {
        Identity::Student(s) => team_student::Entity::find()
            .filter(team_student::Column::StudentId.eq(s.id))
            .find_also_related(team::Entity)
            .order_by_asc(team_student::Column::JoinedAt)
            .all(&state.db)
            .await?
            .into_iter()
            .filter_map(|(_, t)| t)
            .map(TeamResponse::from)
            .collect(),
        Identity::Teacher(t) => team::Entity::find()
            .filter(team::Column::TeacherId.eq(t.id))
            .order_by_desc(team::Column::CreatedAt)
            .all(&state.db)
            .await?
            .into_iter()
            .map(TeamResponse::from)
            .collect(),
    };

    Ok(Json(data))
}

/// Full team view with owning teacher, members, and assignments.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get a team by ID",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team details", body = TeamDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id))]
pub async fn get_team(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamDetailResponse>, AppError> {
    let team_model = find_team(&state.db, id).await?;

    let teacher_model = find_teacher(&state.db, team_model.teacher_id)
        .await
        .map_err(|_| AppError::Internal("Team owner missing".into()))?;

    let members = team_student::Entity::find()
        .filter(team_student::Column::TeamId.eq(id))
        .find_also_related(student::Entity)
        .order_by_asc(team_student::Column::JoinedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(_, s)| s)
        .map(AccountSummary::from)
        .collect();

    let assignments = assignment::Entity::find()
        .filter(assignment::Column::TeamId.eq(id))
        .order_by_asc(assignment::Column::Deadline)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(TeamDetailResponse {
        id: team_model.id,
        name: team_model.name,
        code: team_model.code,
        description: team_model.description,
        teacher: AccountSummary::from(teacher_model),
        members,
        assignments,
        created_at: team_model.created_at,
        updated_at: team_model.updated_at,
    }))
}

/// Update a team's name or description. Owning teacher only.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, id))]
pub async fn update_team(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    validate_update_team(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, id).await?;
    require_owner(&existing, caller.id)?;

    if payload == UpdateTeamRequest::default() {
        return Ok(Json(TeamResponse::from(existing)));
    }

    let mut active: team::ActiveModel = existing.into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(TeamResponse::from(model)))
}

/// Delete a team together with its memberships and assignments.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teams",
    operation_id = "deleteTeam",
    summary = "Delete a team",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id, id))]
pub async fn delete_team(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, id).await?;
    require_owner(&existing, caller.id)?;

    cascade::delete_team_cascade(&txn, id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Join a team using its join code (student self-enrollment).
#[utoipa::path(
    post,
    path = "/join",
    tag = "Teams",
    operation_id = "joinTeam",
    summary = "Join a team by code",
    request_body = JoinTeamRequest,
    responses(
        (status = 201, description = "Joined", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Invalid team code (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(student_id = caller.id))]
pub async fn join_team(
    AuthStudent(caller): AuthStudent,
    State(state): State<AppState>,
    AppJson(payload): AppJson<JoinTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = payload.code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("Team code is required".into()));
    }

    let txn = state.db.begin().await?;
    let team_model = team::Entity::find()
        .filter(team::Column::Code.eq(code))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid team code".into()))?;

    let new_member = team_student::ActiveModel {
        team_id: Set(team_model.id),
        student_id: Set(caller.id),
        joined_at: Set(chrono::Utc::now()),
    };

    // The composite primary key rejects duplicate membership atomically,
    // so concurrent joins cannot insert two rows.
    match new_member.insert(&txn).await {
        Ok(_) => {
            txn.commit().await?;
            Ok((StatusCode::CREATED, Json(TeamResponse::from(team_model))))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(AppError::Conflict("Already a member of this team".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Teacher-initiated enrollment of a student by SAP ID.
#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Teams",
    operation_id = "addTeamMember",
    summary = "Add a student to a team by SAP ID",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = TeamMemberResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team or student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a member (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(teacher_id = caller.id, team_id))]
pub async fn add_member(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    AppJson(payload): AppJson<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, team_id).await?;
    require_owner(&team_model, caller.id)?;

    let student_model = student::Entity::find()
        .filter(student::Column::Sapid.eq(payload.sapid))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

    let now = chrono::Utc::now();
    let new_member = team_student::ActiveModel {
        team_id: Set(team_id),
        student_id: Set(student_model.id),
        joined_at: Set(now),
    };

    match new_member.insert(&txn).await {
        Ok(model) => {
            txn.commit().await?;
            Ok((
                StatusCode::CREATED,
                Json(TeamMemberResponse {
                    team_id: model.team_id,
                    student_id: model.student_id,
                    username: student_model.username,
                    sapid: student_model.sapid,
                    joined_at: model.joined_at,
                }),
            ))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(AppError::Conflict("Already a member of this team".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a student from a team. Owning teacher only.
#[utoipa::path(
    delete,
    path = "/{id}/members/{student_id}",
    tag = "Teams",
    operation_id = "removeTeamMember",
    summary = "Remove a student from a team",
    params(
        ("id" = i32, Path, description = "Team ID"),
        ("student_id" = i32, Path, description = "Student ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owning teacher (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team or membership not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(teacher_id = caller.id, team_id, student_id))]
pub async fn remove_member(
    AuthTeacher(caller): AuthTeacher,
    State(state): State<AppState>,
    Path((team_id, student_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, team_id).await?;
    require_owner(&team_model, caller.id)?;

    let membership = team_student::Entity::find_by_id((team_id, student_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Membership not found".into()))?;

    let active: team_student::ActiveModel = membership.into();
    active.delete(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

fn require_owner(team_model: &team::Model, teacher_id: i32) -> Result<(), AppError> {
    if team_model.teacher_id == teacher_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

pub(crate) async fn find_team<C: ConnectionTrait>(db: &C, id: i32) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

pub(crate) async fn find_team_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

/// Whether a student belongs to a team.
pub(crate) async fn is_team_member<C: ConnectionTrait>(
    db: &C,
    team_id: i32,
    student_id: i32,
) -> Result<bool, AppError> {
    let exists = team_student::Entity::find_by_id((team_id, student_id))
        .one(db)
        .await?
        .is_some();
    Ok(exists)
}
