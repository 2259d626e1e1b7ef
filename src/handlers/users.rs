// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermUserDelete, PermUserRead, PermUserWrite, RequirePermission},
    models::{
        auth::{Account, UserWithAccount},
        user::{
            CreateUserPayload, DeleteUserOutcome, Pagination, SetStatusPayload, UpdateUserPayload,
            UserDetail, UserList, UsersByIdsPayload,
        },
    },
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(Pagination),
    responses(
        (status = 200, description = "One page of users", body = UserList)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserRead>,
    Query(page): Query<Pagination>,
) -> Result<Json<UserList>, AppError> {
    let users = app_state.user_service.list_users(page).await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users/by-ids",
    tag = "Users",
    request_body = UsersByIdsPayload,
    responses(
        (status = 200, description = "Users with the given ids", body = UserList)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_users_by_ids(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserRead>,
    Json(payload): Json<UsersByIdsPayload>,
) -> Result<Json<UserList>, AppError> {
    payload.validate()?;

    let page = Pagination {
        page: payload.page,
        page_size: payload.page_size,
    };
    let users = app_state.user_service.get_users_by_ids(&payload.ids, page).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User with account, roles and permissions", body = UserDetail),
        (status = 404, description = "No such user")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetail>, AppError> {
    let user = app_state.user_service.get_user(id).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = UserWithAccount),
        (status = 409, description = "Username, phone or email already taken"),
        (status = 503, description = "Permission service unavailable, nothing was created")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserWrite>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.user_service.create_user(payload).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Updated user", body = UserWithAccount),
        (status = 404, description = "No such user")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<UserWithAccount>, AppError> {
    payload.validate()?;

    let updated = app_state.user_service.update_user(id, payload).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    tag = "Users",
    request_body = SetStatusPayload,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account with its new status", body = Account),
        (status = 404, description = "No such account")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_account_status(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<Json<Account>, AppError> {
    let account = app_state.user_service.set_account_status(id, payload.status).await?;
    Ok(Json(account))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted; remote cleanup problems are listed as warnings", body = DeleteUserOutcome),
        (status = 404, description = "No such user")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermUserDelete>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteUserOutcome>, AppError> {
    let outcome = app_state.user_service.delete_user(id).await?;
    Ok(Json(outcome))
}
