// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

/// A permission code a route can demand.
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Rejects the request unless the access token's permission snapshot holds
/// `T::slug()`. Must run behind `auth_guard`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        let required = T::slug();
        if !claims.has_permission(required) {
            return Err(AppError::MissingPermission(required.to_string()));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// Permission types
// ---

pub struct PermUserRead;
impl PermissionDef for PermUserRead {
    fn slug() -> &'static str { "user:read" }
}

pub struct PermUserWrite;
impl PermissionDef for PermUserWrite {
    fn slug() -> &'static str { "user:write" }
}

pub struct PermUserDelete;
impl PermissionDef for PermUserDelete {
    fn slug() -> &'static str { "user:delete" }
}
