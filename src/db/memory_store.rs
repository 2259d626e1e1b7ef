// src/db/memory_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::CredentialStore,
    models::{
        auth::{Account, AccountStatus, User},
        user::{AccountChanges, NewAccount, NewUser, Pagination, UserChanges},
    },
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Keyed by `user_id`; the relation is one-to-one.
    accounts: HashMap<Uuid, Account>,
    /// User ids in insertion order, for stable listing.
    order: Vec<Uuid>,
}

impl Tables {
    fn insert_user(&mut self, new: NewUser) -> Result<User, AppError> {
        if self.users.values().any(|u| u.phone == new.phone) {
            return Err(AppError::PhoneAlreadyExists);
        }
        if let Some(email) = &new.email {
            if self.users.values().any(|u| u.email.as_ref() == Some(email)) {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            gender: new.gender,
            phone: new.phone,
            email: new.email,
            ward_code: new.ward_code,
            address: new.address,
            avatar: new.avatar,
            company_id: new.company_id,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        self.order.push(user.id);
        Ok(user)
    }

    fn insert_account(&mut self, user_id: Uuid, new: NewAccount) -> Result<Account, AppError> {
        if !self.users.contains_key(&user_id) {
            return Err(AppError::UserNotFound);
        }
        if self.accounts.values().any(|a| a.username == new.username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        if self.accounts.contains_key(&user_id) {
            return Err(AppError::UniqueConstraintViolation("accounts_user_id_key".into()));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            username: new.username,
            password_hash: new.password_hash,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(user_id, account.clone());
        Ok(account)
    }

    fn update_user(&mut self, id: Uuid, changes: UserChanges) -> Result<User, AppError> {
        if let Some(phone) = &changes.phone {
            if self.users.values().any(|u| u.id != id && &u.phone == phone) {
                return Err(AppError::PhoneAlreadyExists);
            }
        }
        if let Some(email) = &changes.email {
            if self
                .users
                .values()
                .any(|u| u.id != id && u.email.as_ref() == Some(email))
            {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        let user = self.users.get_mut(&id).ok_or(AppError::UserNotFound)?;
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.gender {
            user.gender = v;
        }
        if let Some(v) = changes.phone {
            user.phone = v;
        }
        if changes.email.is_some() {
            user.email = changes.email;
        }
        if changes.ward_code.is_some() {
            user.ward_code = changes.ward_code;
        }
        if changes.address.is_some() {
            user.address = changes.address;
        }
        if changes.avatar.is_some() {
            user.avatar = changes.avatar;
        }
        if changes.company_id.is_some() {
            user.company_id = changes.company_id;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn update_account(&mut self, user_id: Uuid, changes: AccountChanges) -> Result<Option<Account>, AppError> {
        if let Some(username) = &changes.username {
            if self
                .accounts
                .values()
                .any(|a| a.user_id != user_id && &a.username == username)
            {
                return Err(AppError::UsernameAlreadyExists);
            }
        }

        let Some(account) = self.accounts.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(v) = changes.username {
            account.username = v;
        }
        if let Some(v) = changes.password_hash {
            account.password_hash = v;
        }
        if let Some(v) = changes.status {
            account.status = v;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    fn page<'a>(&'a self, ids: impl Iterator<Item = &'a Uuid>, page: Pagination) -> Vec<User> {
        let (limit, offset) = page.limit_offset();
        ids.filter_map(|id| self.users.get(id))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect()
    }
}

/// In-process store with the same transactional behaviour as the Postgres
/// one: every write works on a copy of the tables that replaces the live
/// copy only if the whole operation succeeded.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    async fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut live = self.tables.write().await;
        let mut staged = live.clone();
        let out = f(&mut staged)?;
        *live = staged;
        Ok(out)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_account_by_user_id(&self, user_id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.tables.read().await.accounts.get(&user_id).cloned())
    }

    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<(User, Account), AppError> {
        self.transaction(|t| {
            let user = t.insert_user(user)?;
            let account = t.insert_account(user.id, account)?;
            Ok((user, account))
        })
        .await
    }

    async fn list_users(&self, page: Pagination) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.page(tables.order.iter(), page))
    }

    async fn find_users_by_ids(&self, ids: &[Uuid], page: Pagination) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.page(tables.order.iter().filter(|id| ids.contains(*id)), page))
    }

    async fn update_user_with_account(
        &self,
        id: Uuid,
        user: UserChanges,
        account: AccountChanges,
    ) -> Result<(User, Option<Account>), AppError> {
        self.transaction(|t| {
            let user = t.update_user(id, user)?;
            let account = if account.is_empty() {
                t.accounts.get(&id).cloned()
            } else {
                let acc = t
                    .update_account(id, account)?
                    .ok_or_else(|| AppError::InvalidInput(format!("user {} has no account", id)))?;
                Some(acc)
            };
            Ok((user, account))
        })
        .await
    }

    async fn set_account_status(&self, user_id: Uuid, status: AccountStatus) -> Result<Account, AppError> {
        self.transaction(|t| {
            let changes = AccountChanges {
                status: Some(status),
                ..Default::default()
            };
            t.update_account(user_id, changes)?.ok_or(AppError::UserNotFound)
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        self.transaction(|t| {
            t.accounts.remove(&id);
            t.users.remove(&id).ok_or(AppError::UserNotFound)?;
            t.order.retain(|u| *u != id);
            Ok(())
        })
        .await
    }
}
