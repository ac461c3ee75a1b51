//! Teacher credential controller. Deliberately parallel to the student
//! controller: the two roles live in disjoint tables and never share ids.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::teacher;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, AuthTeacher};
use crate::extractors::json::AppJson;
use crate::models::account::{
    AccountListResponse, AccountResponse, LoginRequest, LoginResponse, RegisterRequest,
    SearchQuery, UpdateProfileRequest, validate_login_request, validate_register_request,
    validate_update_profile,
};
use crate::models::shared::{ListQuery, Pagination, escape_like};
use crate::state::AppState;
use crate::utils::cascade;
use crate::utils::upload::{
    IMAGE_CONTENT_TYPES, ensure_allowed_type, map_storage_error, read_file_field, stream_blob,
};
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Teachers",
    operation_id = "registerTeacher",
    summary = "Register a new teacher",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Teacher created", body = AccountResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email or SAP ID already registered (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let new_teacher = teacher::ActiveModel {
        sapid: Set(payload.sapid),
        username: Set(payload.username.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        password: Set(hash),
        description: Set(payload.description),
        avatar_hash: Set(None),
        avatar_content_type: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_teacher
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email or SAP ID already registered".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::from_teacher(model)),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Teachers",
    operation_id = "loginTeacher",
    summary = "Log in as a teacher",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "No teacher with that SAP ID (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(sapid = payload.sapid))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let model = teacher::Entity::find()
        .filter(teacher::Column::Sapid.eq(payload.sapid))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".into()))?;

    let is_valid = hash::verify_password(&payload.password, &model.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        model.id,
        &model.username,
        "teacher",
        state.config.auth.token_ttl_hours,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        id: model.id,
        username: model.username,
        role: "teacher",
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Teachers",
    operation_id = "getTeacherProfile",
    summary = "Get own profile",
    responses(
        (status = 200, description = "Profile", body = AccountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(model), fields(teacher_id = model.id))]
pub async fn me(AuthTeacher(model): AuthTeacher) -> Json<AccountResponse> {
    Json(AccountResponse::from_teacher(model))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Teachers",
    operation_id = "updateTeacherProfile",
    summary = "Update own profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model, payload), fields(teacher_id = model.id))]
pub async fn update_me(
    AuthTeacher(model): AuthTeacher,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    validate_update_profile(&payload)?;

    if payload == UpdateProfileRequest::default() {
        return Ok(Json(AccountResponse::from_teacher(model)));
    }

    let mut active: teacher::ActiveModel = model.into();
    if let Some(ref username) = payload.username {
        active.username = Set(username.trim().to_string());
    }
    if let Some(ref email) = payload.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already registered".into())
        }
        _ => AppError::from(e),
    })?;

    Ok(Json(AccountResponse::from_teacher(model)))
}

#[utoipa::path(
    post,
    path = "/me/avatar",
    tag = "Teachers",
    operation_id = "uploadTeacherAvatar",
    summary = "Upload own profile picture",
    request_body(content_type = "multipart/form-data", description = "An `image` field (jpeg or png)"),
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Missing or unsupported image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model, multipart), fields(teacher_id = model.id))]
pub async fn upload_avatar(
    AuthTeacher(model): AuthTeacher,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AccountResponse>, AppError> {
    let mut uploaded = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("image") {
            uploaded = Some(read_file_field(field).await?);
        }
    }

    let file = uploaded.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;
    ensure_allowed_type(&file, IMAGE_CONTENT_TYPES)?;

    let hash = state
        .blob_store
        .put(&file.bytes)
        .await
        .map_err(map_storage_error)?;

    let mut active: teacher::ActiveModel = model.into();
    active.avatar_hash = Set(Some(hash.to_hex()));
    active.avatar_content_type = Set(file.content_type);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(AccountResponse::from_teacher(model)))
}

#[utoipa::path(
    get,
    path = "/{id}/avatar",
    tag = "Teachers",
    operation_id = "getTeacherAvatar",
    summary = "Fetch a teacher's profile picture",
    params(("id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Teacher or picture not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let model = find_teacher(&state.db, id).await?;
    let hash_hex = model
        .avatar_hash
        .ok_or_else(|| AppError::NotFound("No profile picture".into()))?;
    stream_blob(&state, &hash_hex, model.avatar_content_type.as_deref(), None).await
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teachers",
    operation_id = "listTeachers",
    summary = "List teachers",
    params(ListQuery),
    responses(
        (status = 200, description = "List of teachers", body = AccountListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_teachers(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AccountListResponse>, AppError> {
    let (page, per_page) = query.clamped();

    let select = teacher::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by_asc(teacher::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(AccountResponse::from_teacher)
        .collect();

    Ok(Json(AccountListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "Teachers",
    operation_id = "searchTeachers",
    summary = "Search teachers",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching teachers", body = Vec<AccountResponse>),
        (status = 400, description = "Empty query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn search_teachers(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(AppError::Validation("Search query must not be empty".into()));
    }

    let mut cond = Condition::any().add(
        Expr::expr(Func::lower(Expr::col(teacher::Column::Username))).like(
            LikeExpr::new(format!("%{}%", escape_like(term).to_lowercase())).escape('\\'),
        ),
    );
    if let Ok(sapid) = term.parse::<i32>() {
        cond = cond.add(teacher::Column::Sapid.eq(sapid));
    }

    let data = teacher::Entity::find()
        .filter(cond)
        .order_by_asc(teacher::Column::Username)
        .limit(50)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AccountResponse::from_teacher)
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teachers",
    operation_id = "getTeacher",
    summary = "Get a teacher by ID",
    params(("id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher profile", body = AccountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Teacher not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id))]
pub async fn get_teacher(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AccountResponse>, AppError> {
    let model = find_teacher(&state.db, id).await?;
    Ok(Json(AccountResponse::from_teacher(model)))
}

/// Delete the calling teacher and everything they own: teams (with
/// memberships and assignments), question-generation batches, and the
/// dependent submission and document rows.
#[utoipa::path(
    delete,
    path = "/me",
    tag = "Teachers",
    operation_id = "deleteTeacher",
    summary = "Delete own account",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model), fields(teacher_id = model.id))]
pub async fn delete_me(
    AuthTeacher(model): AuthTeacher,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    cascade::delete_teacher_cascade(&txn, model.id).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_teacher<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<teacher::Model, AppError> {
    teacher::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".into()))
}
