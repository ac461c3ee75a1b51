use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::student;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthIdentity, AuthStudent};
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

/// Register a new student account.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Students",
    operation_id = "registerStudent",
    summary = "Register a new student",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student created", body = AccountResponse),
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
    let new_student = student::ActiveModel {
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

    // No check-then-insert: the unique indexes on email and sapid make
    // concurrent duplicate registrations fail atomically.
    let model = new_student
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
        Json(AccountResponse::from_student(model)),
    ))
}

/// Log a student in by SAP ID and password.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Students",
    operation_id = "loginStudent",
    summary = "Log in as a student",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "No student with that SAP ID (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(sapid = payload.sapid))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let model = student::Entity::find()
        .filter(student::Column::Sapid.eq(payload.sapid))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;

    let is_valid = hash::verify_password(&payload.password, &model.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        model.id,
        &model.username,
        "student",
        state.config.auth.token_ttl_hours,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        id: model.id,
        username: model.username,
        role: "student",
    }))
}

/// Return the calling student's own profile.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Students",
    operation_id = "getStudentProfile",
    summary = "Get own profile",
    responses(
        (status = 200, description = "Profile", body = AccountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not a student (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(model), fields(student_id = model.id))]
pub async fn me(AuthStudent(model): AuthStudent) -> Json<AccountResponse> {
    Json(AccountResponse::from_student(model))
}

/// Update the calling student's profile with PATCH semantics.
#[utoipa::path(
    patch,
    path = "/me",
    tag = "Students",
    operation_id = "updateStudentProfile",
    summary = "Update own profile",
    description = "Partially updates the profile; absent fields are left unchanged, so a later fetch returns the updated fields merged with the untouched ones.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model, payload), fields(student_id = model.id))]
pub async fn update_me(
    AuthStudent(model): AuthStudent,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    validate_update_profile(&payload)?;

    if payload == UpdateProfileRequest::default() {
        return Ok(Json(AccountResponse::from_student(model)));
    }

    let mut active: student::ActiveModel = model.into();
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

    Ok(Json(AccountResponse::from_student(model)))
}

/// Upload the calling student's profile picture.
#[utoipa::path(
    post,
    path = "/me/avatar",
    tag = "Students",
    operation_id = "uploadStudentAvatar",
    summary = "Upload own profile picture",
    request_body(content_type = "multipart/form-data", description = "An `image` field (jpeg or png)"),
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Missing or unsupported image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model, multipart), fields(student_id = model.id))]
pub async fn upload_avatar(
    AuthStudent(model): AuthStudent,
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

    let mut active: student::ActiveModel = model.into();
    active.avatar_hash = Set(Some(hash.to_hex()));
    active.avatar_content_type = Set(file.content_type);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(AccountResponse::from_student(model)))
}

/// Serve a student's profile picture. Unauthenticated so it can be used
/// directly as an image source.
#[utoipa::path(
    get,
    path = "/{id}/avatar",
    tag = "Students",
    operation_id = "getStudentAvatar",
    summary = "Fetch a student's profile picture",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Student or picture not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let model = find_student(&state.db, id).await?;
    let hash_hex = model
        .avatar_hash
        .ok_or_else(|| AppError::NotFound("No profile picture".into()))?;
    stream_blob(&state, &hash_hex, model.avatar_content_type.as_deref(), None).await
}

/// List students with pagination.
#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    params(ListQuery),
    responses(
        (status = 200, description = "List of students", body = AccountListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_students(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AccountListResponse>, AppError> {
    let (page, per_page) = query.clamped();

    let select = student::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by_asc(student::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(AccountResponse::from_student)
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

/// Search students by username substring or exact SAP ID.
#[utoipa::path(
    get,
    path = "/search",
    tag = "Students",
    operation_id = "searchStudents",
    summary = "Search students",
    description = "Case-insensitive username substring match, OR exact SAP ID match when the query parses as a number. Returns at most 50 matches.",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching students", body = Vec<AccountResponse>),
        (status = 400, description = "Empty query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn search_students(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(AppError::Validation("Search query must not be empty".into()));
    }

    let mut cond = Condition::any().add(
        Expr::expr(Func::lower(Expr::col(student::Column::Username))).like(
            LikeExpr::new(format!("%{}%", escape_like(term).to_lowercase())).escape('\\'),
        ),
    );
    if let Ok(sapid) = term.parse::<i32>() {
        cond = cond.add(student::Column::Sapid.eq(sapid));
    }

    let data = student::Entity::find()
        .filter(cond)
        .order_by_asc(student::Column::Username)
        .limit(50)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AccountResponse::from_student)
        .collect();

    Ok(Json(data))
}

/// Get a student's public profile by ID.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student by ID",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student profile", body = AccountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth), fields(id))]
pub async fn get_student(
    _auth: AuthIdentity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AccountResponse>, AppError> {
    let model = find_student(&state.db, id).await?;
    Ok(Json(AccountResponse::from_student(model)))
}

/// Delete the calling student's account and everything it owns.
#[utoipa::path(
    delete,
    path = "/me",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete own account",
    description = "Removes the account together with its team memberships, submissions, and dependent document records.",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, model), fields(student_id = model.id))]
pub async fn delete_me(
    AuthStudent(model): AuthStudent,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    cascade::delete_student_cascade(&txn, model.id).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn find_student<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}
