// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::get_me,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_users_by_ids,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::set_account_status,
        handlers::users::delete_user,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Gender,
            models::auth::AccountStatus,
            models::auth::User,
            models::auth::Account,
            models::auth::UserWithAccount,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RefreshTokenPayload,
            models::auth::LoginResponse,
            models::auth::MeResponse,
            models::auth::RefreshTokenResponse,

            // --- Users ---
            models::user::AccountInput,
            models::user::AccountUpdateInput,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,
            models::user::SetStatusPayload,
            models::user::UsersByIdsPayload,
            models::user::UserDetail,
            models::user::UserList,
            models::user::DeleteUserOutcome,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,

            // --- HR ---
            models::employee::Organization,
            models::employee::Department,
            models::employee::Position,
            models::employee::Employee,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Users", description = "User and account management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
