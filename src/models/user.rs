// src/models/user.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    auth::{validate_alphanumeric, validate_numeric, Account, AccountStatus, Gender, User, UserWithAccount},
    rbac::{Permission, Role},
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// ---
// Store-level inputs
// ---

/// Profile fields for a brand-new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub ward_code: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub status: AccountStatus,
}

/// Partial profile update; `None` leaves the column untouched. There is no
/// way to clear a nullable column back to NULL: updates only ever set values.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub ward_code: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub status: Option<AccountStatus>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password_hash.is_none() && self.status.is_none()
    }
}

// ---
// Pagination
// ---

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// `(limit, offset)` with defaults applied and the page size capped.
    pub fn limit_offset(&self) -> (i64, i64) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let size = self
            .page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        (size as i64, (page as i64 - 1) * size as i64)
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AccountInput {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3 to 20 characters."),
        custom(function = "validate_alphanumeric")
    )]
    pub username: String,

    #[validate(length(min = 6, max = 50, message = "Password must be 6 to 50 characters."))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 50, message = "First name is required (max 50)."))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name is required (max 50)."))]
    pub last_name: String,

    #[serde(default)]
    pub gender: Gender,

    #[validate(email(message = "Email is invalid."))]
    pub email: Option<String>,

    #[validate(
        length(min = 10, max = 15, message = "Phone must be 10 to 15 digits."),
        custom(function = "validate_numeric")
    )]
    pub phone: String,

    #[validate(
        length(min = 3, max = 10, message = "Ward code must be 3 to 10 digits."),
        custom(function = "validate_numeric")
    )]
    pub ward_code: Option<String>,

    #[validate(length(max = 200, message = "Address is too long (max 200)."))]
    pub address: Option<String>,

    pub avatar: Option<String>,

    pub company_id: Option<String>,

    #[validate(nested)]
    pub account: AccountInput,

    #[serde(default)]
    pub perm_ids: Vec<Uuid>,

    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AccountUpdateInput {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3 to 20 characters."),
        custom(function = "validate_alphanumeric")
    )]
    pub username: Option<String>,

    /// When present the password is re-hashed.
    #[validate(length(min = 6, max = 50, message = "Password must be 6 to 50 characters."))]
    pub password: Option<String>,

    pub status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 50, message = "First name must be 1 to 50 characters."))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Last name must be 1 to 50 characters."))]
    pub last_name: Option<String>,

    pub gender: Option<Gender>,

    #[validate(email(message = "Email is invalid."))]
    pub email: Option<String>,

    #[validate(
        length(min = 10, max = 15, message = "Phone must be 10 to 15 digits."),
        custom(function = "validate_numeric")
    )]
    pub phone: Option<String>,

    #[validate(
        length(min = 3, max = 10, message = "Ward code must be 3 to 10 digits."),
        custom(function = "validate_numeric")
    )]
    pub ward_code: Option<String>,

    #[validate(length(max = 200, message = "Address is too long (max 200)."))]
    pub address: Option<String>,

    pub avatar: Option<String>,

    pub company_id: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub account: Option<AccountUpdateInput>,

    /// Replaces the user's direct permissions when present.
    pub perm_ids: Option<Vec<Uuid>>,

    /// Replaces the user's roles when present.
    pub role_ids: Option<Vec<Uuid>>,
}

impl UpdateUserPayload {
    pub fn user_changes(&self) -> UserChanges {
        UserChanges {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender,
            phone: self.phone.clone(),
            email: self.email.clone(),
            ward_code: self.ward_code.clone(),
            address: self.address.clone(),
            avatar: self.avatar.clone(),
            company_id: self.company_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusPayload {
    pub status: AccountStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UsersByIdsPayload {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 ids are required."))]
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

// ---
// Responses
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    pub user: UserWithAccount,
    pub roles: Vec<Role>,
    pub perms: Vec<Permission>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub users: Vec<User>,
}

/// Result of the delete saga. `warnings` lists remote cleanup steps that failed.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DeleteUserOutcome {
    pub success: bool,
    pub warnings: Vec<String>,
}

impl From<(User, Option<Account>)> for UserWithAccount {
    fn from((user, account): (User, Option<Account>)) -> Self {
        Self { user, account }
    }
}
