// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{
        LoginResponse, LoginUserPayload, MeResponse, RefreshTokenPayload, RefreshTokenResponse,
        RegisterUserPayload, UserWithAccount,
    },
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "User and account created", body = UserWithAccount),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "Username, phone or email already taken")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.auth_service.register(payload).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Tokens and the caller's profile", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "Account is inactive"),
        (status = 503, description = "Permission service unavailable")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.login(payload).await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "New token pair", body = RefreshTokenResponse),
        (status = 401, description = "Refresh token invalid, or expired (code token_expired)")
    )
)]
pub async fn refresh_token(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.refresh_token(&payload.refresh_token).await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The authenticated user", body = MeResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 403, description = "Account has been deactivated")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Json<MeResponse>, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::InvalidToken)?;

    let me = app_state.auth_service.decode_token(bearer.token()).await?;

    Ok(Json(me))
}
