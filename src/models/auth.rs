// src/models/auth.rs

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;
use crate::models::{
    employee::Employee,
    rbac::{Permission, Role},
};

// ---
// Enums shared with the database
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Other,
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Other => "other",
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "other" => Ok(Gender::Other),
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            other => Err(AppError::InvalidInput(format!(
                "gender must be one of other, female, male (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(AppError::InvalidInput(format!(
                "status must be active or inactive (got '{}')",
                other
            ))),
        }
    }
}

// ---
// Rows
// ---

/// Profile identity.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Nguyen")]
    pub last_name: String,
    pub gender: Gender,
    #[schema(example = "0901234567")]
    pub phone: String,
    pub email: Option<String>,
    pub ward_code: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub company_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login identity. Exactly one per user.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "alice")]
    pub username: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// A user with its account attached, as returned by register and /me.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithAccount {
    #[serde(flatten)]
    pub user: User,
    pub account: Option<Account>,
}

// ---
// Validation helpers
// ---

pub(crate) fn validate_numeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("numeric");
    err.message = Some("Must contain digits only.".into());
    Err(err)
}

pub(crate) fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(());
    }
    let mut err = ValidationError::new("alphanumeric");
    err.message = Some("Must contain letters and digits only.".into());
    Err(err)
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3 to 20 characters."),
        custom(function = "validate_alphanumeric")
    )]
    #[schema(example = "alice")]
    pub username: String,

    #[validate(length(min = 6, max = 20, message = "Password must be 6 to 20 characters."))]
    #[schema(example = "pw123456")]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "First name is required (max 50)."))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name is required (max 50)."))]
    pub last_name: String,

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

    #[serde(default)]
    pub gender: Gender,

    pub company_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, max = 20, message = "Username is required."))]
    #[schema(example = "alice")]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    #[schema(example = "pw123456")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenPayload {
    #[validate(length(min = 1, message = "refresh_token is required."))]
    pub refresh_token: String,
}

// ---
// Responses
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
    pub account: Account,
    pub employee: Option<Employee>,
    pub roles: Vec<Role>,
    pub perms: Vec<Permission>,
}

/// Body of the "who am I" endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserWithAccount,
    pub employee: Option<Employee>,
    pub roles: Vec<Role>,
    pub perms: Vec<Permission>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Lifetime of the new access token, in seconds.
    pub expires_in: i64,
}

// ---
// JWT claims
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Short-lived claims. `perms` is the entitlement snapshot taken at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub employee_id: Option<i64>,
    pub org_id: Option<i64>,
    #[serde(default)]
    pub employee_status: String,
    #[serde(default)]
    pub perms: BTreeSet<String>,
    pub token_use: TokenUse,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn has_permission(&self, code: &str) -> bool {
        self.perms.contains(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: Uuid,
    pub token_use: TokenUse,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}
