// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Duration;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::CredentialStore,
    models::{
        auth::{
            AccessClaims, Account, AccountStatus, LoginResponse, LoginUserPayload, MeResponse,
            RefreshTokenResponse, RegisterUserPayload, User, UserWithAccount,
        },
        employee::Employee,
        rbac::RolesAndPerms,
        user::{NewAccount, NewUser},
    },
    services::{AccessGrant, EmployeeService, RbacService, TokenCodec},
};

pub const TOKEN_TYPE: &str = "Bearer";

// ---
// Password hashing
// ---

pub(crate) async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hashed)
}

pub(crate) async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}

/// Register, login, token introspection and token refresh.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    rbac: RbacService,
    employees: EmployeeService,
    tokens: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        rbac: RbacService,
        employees: EmployeeService,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            store,
            rbac,
            employees,
            tokens,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub async fn register(&self, payload: RegisterUserPayload) -> Result<UserWithAccount, AppError> {
        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;

        let new_user = NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            gender: payload.gender,
            phone: payload.phone,
            email: payload.email,
            ward_code: payload.ward_code,
            address: payload.address,
            avatar: payload.avatar,
            company_id: payload.company_id,
        };
        let new_account = NewAccount {
            username: payload.username,
            password_hash,
            status: AccountStatus::Active,
        };

        let (user, account) = self.store.create_user_with_account(new_user, new_account).await?;

        tracing::info!("✅ Registered user {} ({})", user.id, account.username);

        Ok(UserWithAccount {
            user,
            account: Some(account),
        })
    }

    pub async fn login(&self, payload: LoginUserPayload) -> Result<LoginResponse, AppError> {
        // Unknown username and wrong password look the same to the caller.
        let account = self
            .store
            .find_account_by_username(&payload.username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !account.is_active() {
            return Err(AppError::AccountInactive);
        }

        if !verify_password(&payload.password, &account.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let user = self.store.find_user_by_account(&account).await?;

        let (entitlements, employee) = self.fetch_entitlements(user.id).await?;

        let access_token = self.sign_access(user.id, employee.as_ref(), &entitlements)?;
        let refresh_token = self.tokens.sign_refresh_token(user.id, self.refresh_ttl)?;

        tracing::info!("✅ User {} logged in", user.id);

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
            account,
            employee,
            roles: entitlements.roles,
            perms: entitlements.perms,
        })
    }

    /// Introspection behind "who am I". Mints nothing.
    pub async fn decode_token(&self, token: &str) -> Result<MeResponse, AppError> {
        let claims = self.tokens.verify_access(token)?;

        let (user, account) = self.load_active(claims.user_id).await?;
        let (entitlements, employee) = self.fetch_entitlements(user.id).await?;

        Ok(MeResponse {
            user: UserWithAccount {
                user,
                account: Some(account),
            },
            employee,
            roles: entitlements.roles,
            perms: entitlements.perms,
        })
    }

    /// Rotates both tokens, taking a fresh entitlement snapshot.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse, AppError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let (user, _) = self.load_active(claims.user_id).await?;
        let (entitlements, employee) = self.fetch_entitlements(user.id).await?;

        let access_token = self.sign_access(user.id, employee.as_ref(), &entitlements)?;
        let refresh_token = self.tokens.sign_refresh_token(user.id, self.refresh_ttl)?;

        Ok(RefreshTokenResponse {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Stateless access-token check used by the request guard.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        Ok(self.tokens.verify_access(token)?)
    }

    // ---
    // Helpers
    // ---

    /// A token whose user or account has disappeared is as good as invalid.
    async fn load_active(&self, user_id: Uuid) -> Result<(User, Account), AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        let account = self
            .store
            .find_account_by_user_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !account.is_active() {
            return Err(AppError::AccountInactive);
        }
        Ok((user, account))
    }

    /// Roles/perms are load-bearing, the employee record is not. Both calls
    /// run concurrently and finish before anything is signed.
    async fn fetch_entitlements(&self, user_id: Uuid) -> Result<(RolesAndPerms, Option<Employee>), AppError> {
        let (entitlements, employee) = tokio::join!(
            self.rbac.get_roles_and_perms(user_id),
            self.employees.get_employee_info(user_id),
        );
        Ok((entitlements?, employee))
    }

    fn sign_access(
        &self,
        user_id: Uuid,
        employee: Option<&Employee>,
        entitlements: &RolesAndPerms,
    ) -> Result<String, AppError> {
        let grant = AccessGrant {
            user_id,
            employee_id: employee.map(|e| e.id),
            org_id: employee.and_then(|e| e.org_id),
            employee_status: employee.map(|e| e.status.clone()).unwrap_or_default(),
            perms: entitlements.permission_codes.clone(),
        };
        Ok(self.tokens.sign_access_token(&grant, self.access_ttl)?)
    }
}
