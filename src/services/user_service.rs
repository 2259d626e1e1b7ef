// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::Config,
    db::CredentialStore,
    models::{
        auth::{Account, AccountStatus, UserWithAccount},
        user::{
            AccountChanges, CreateUserPayload, DeleteUserOutcome, NewAccount, NewUser, Pagination,
            UpdateUserPayload, UserDetail, UserList,
        },
    },
    services::{auth::hash_password, RbacService},
};

/// Administrative user management on top of the credential store, keeping
/// the Permission service's assignments in step.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
    rbac: RbacService,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>, rbac: RbacService) -> Self {
        Self {
            store,
            rbac,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserDetail, AppError> {
        let user = self.store.find_user_by_id(id).await?.ok_or(AppError::UserNotFound)?;
        let account = self.store.find_account_by_user_id(id).await?;
        let entitlements = self.rbac.get_roles_and_perms(id).await?;

        Ok(UserDetail {
            user: UserWithAccount { user, account },
            roles: entitlements.roles,
            perms: entitlements.perms,
        })
    }

    pub async fn list_users(&self, page: Pagination) -> Result<UserList, AppError> {
        let users = self.store.list_users(page).await?;
        Ok(UserList { users })
    }

    pub async fn get_users_by_ids(&self, ids: &[Uuid], page: Pagination) -> Result<UserList, AppError> {
        if ids.is_empty() {
            return Ok(UserList { users: Vec::new() });
        }
        let users = self.store.find_users_by_ids(ids, page).await?;
        Ok(UserList { users })
    }

    /// Creates the user and account, then assigns permissions and roles. If the
    /// assignment fails the new user is deleted again.
    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<UserWithAccount, AppError> {
        let password_hash = hash_password(&payload.account.password, self.bcrypt_cost).await?;

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
            username: payload.account.username,
            password_hash,
            status: AccountStatus::Active,
        };

        let (user, account) = self.store.create_user_with_account(new_user, new_account).await?;

        let assigned = self
            .rbac
            .assign(
                user.id,
                non_empty(&payload.perm_ids),
                non_empty(&payload.role_ids),
            )
            .await;

        if let Err(e) = assigned {
            tracing::warn!("⚠️ Rolling back user {} after failed assignment: {}", user.id, e);
            if let Err(undo) = self.store.delete_user(user.id).await {
                tracing::error!("🔥 Could not remove user {} after failed assignment: {}", user.id, undo);
            }
            // Assignments that went through before the failure.
            for warning in self.rbac.cleanup(user.id).await {
                tracing::error!("🔥 Rollback of user {} left remote state behind: {}", user.id, warning);
            }
            return Err(e);
        }

        tracing::info!("✅ Created user {} ({})", user.id, account.username);

        Ok(UserWithAccount {
            user,
            account: Some(account),
        })
    }

    /// Local changes commit first; assignment replacements follow and their
    /// failure does not undo the committed update.
    pub async fn update_user(&self, id: Uuid, payload: UpdateUserPayload) -> Result<UserWithAccount, AppError> {
        let user_changes = payload.user_changes();

        let mut account_changes = AccountChanges::default();
        if let Some(input) = &payload.account {
            account_changes.username = input.username.clone();
            account_changes.status = input.status;
            if let Some(password) = &input.password {
                account_changes.password_hash = Some(hash_password(password, self.bcrypt_cost).await?);
            }
        }

        let (user, account) = self
            .store
            .update_user_with_account(id, user_changes, account_changes)
            .await?;

        self.rbac
            .assign(id, payload.perm_ids.as_deref(), payload.role_ids.as_deref())
            .await?;

        Ok(UserWithAccount { user, account })
    }

    pub async fn set_account_status(&self, id: Uuid, status: AccountStatus) -> Result<Account, AppError> {
        let account = self.store.set_account_status(id, status).await?;
        tracing::info!("✅ Account of user {} is now {}", id, status.as_str());
        Ok(account)
    }

    /// Local delete first; remote cleanup afterwards is best-effort and only
    /// reported.
    pub async fn delete_user(&self, id: Uuid) -> Result<DeleteUserOutcome, AppError> {
        self.store.delete_user(id).await?;

        let warnings = self.rbac.cleanup(id).await;

        tracing::info!("✅ Deleted user {} ({} cleanup warnings)", id, warnings.len());

        Ok(DeleteUserOutcome {
            success: true,
            warnings,
        })
    }
}

fn non_empty(ids: &[Uuid]) -> Option<&[Uuid]> {
    (!ids.is_empty()).then_some(ids)
}
