// src/db/store.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{Account, AccountStatus, User},
        user::{AccountChanges, NewAccount, NewUser, Pagination, UserChanges},
    },
};

/// Access to the `users` and `accounts` tables. No network calls happen
/// behind this trait.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_account_by_user_id(&self, user_id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_user_by_account(&self, account: &Account) -> Result<User, AppError> {
        self.find_user_by_id(account.user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Inserts both rows in one transaction: either both exist afterwards or
    /// neither does.
    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<(User, Account), AppError>;

    async fn list_users(&self, page: Pagination) -> Result<Vec<User>, AppError>;

    async fn find_users_by_ids(&self, ids: &[Uuid], page: Pagination) -> Result<Vec<User>, AppError>;

    /// Atomic update of a user and its account.
    async fn update_user_with_account(
        &self,
        id: Uuid,
        user: UserChanges,
        account: AccountChanges,
    ) -> Result<(User, Option<Account>), AppError>;

    async fn set_account_status(&self, user_id: Uuid, status: AccountStatus) -> Result<Account, AppError>;

    /// Deletes the account (if any) and then the user, atomically.
    async fn delete_user(&self, id: Uuid) -> Result<(), AppError>;
}
