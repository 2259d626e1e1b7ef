// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::store::CredentialStore,
    models::{
        auth::{Account, AccountStatus, User},
        user::{AccountChanges, NewAccount, NewUser, Pagination, UserChanges},
    },
};

const USER_COLUMNS: &str = "id, first_name, last_name, gender, phone, email, ward_code, \
     address, avatar, company_id, created_at, updated_at";

const ACCOUNT_COLUMNS: &str = "id, user_id, username, password_hash, status, created_at, updated_at";

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---
// Statements usable inside or outside a transaction
// ---

async fn insert_user<'e, E>(executor: E, user: &NewUser) -> Result<User, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        INSERT INTO users (
            first_name, last_name, gender, phone, email,
            ward_code, address, avatar, company_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&sql)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.gender)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.ward_code)
        .bind(&user.address)
        .bind(&user.avatar)
        .bind(&user.company_id)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
}

async fn insert_account<'e, E>(executor: E, user_id: Uuid, account: &NewAccount) -> Result<Account, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        INSERT INTO accounts (user_id, username, password_hash, status)
        VALUES ($1, $2, $3, $4)
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(user_id)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.status)
        .fetch_one(executor)
        .await
        .map_err(map_unique_violation)
}

async fn update_user<'e, E>(executor: E, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE users SET
            first_name = COALESCE($2, first_name),
            last_name  = COALESCE($3, last_name),
            gender     = COALESCE($4, gender),
            phone      = COALESCE($5, phone),
            email      = COALESCE($6, email),
            ward_code  = COALESCE($7, ward_code),
            address    = COALESCE($8, address),
            avatar     = COALESCE($9, avatar),
            company_id = COALESCE($10, company_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(changes.gender)
        .bind(&changes.phone)
        .bind(&changes.email)
        .bind(&changes.ward_code)
        .bind(&changes.address)
        .bind(&changes.avatar)
        .bind(&changes.company_id)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
}

async fn update_account<'e, E>(
    executor: E,
    user_id: Uuid,
    changes: &AccountChanges,
) -> Result<Option<Account>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE accounts SET
            username      = COALESCE($2, username),
            password_hash = COALESCE($3, password_hash),
            status        = COALESCE($4, status),
            updated_at    = NOW()
        WHERE user_id = $1
        RETURNING {ACCOUNT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(user_id)
        .bind(&changes.username)
        .bind(&changes.password_hash)
        .bind(changes.status)
        .fetch_optional(executor)
        .await
        .map_err(map_unique_violation)
}

async fn select_account_by_user_id<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Account>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = $1");
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(account)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_account_by_user_id(&self, user_id: Uuid) -> Result<Option<Account>, AppError> {
        select_account_by_user_id(&self.pool, user_id).await
    }

    async fn create_user_with_account(
        &self,
        user: NewUser,
        account: NewAccount,
    ) -> Result<(User, Account), AppError> {
        // Any early return drops `tx`, which rolls it back.
        let mut tx = self.pool.begin().await?;

        let new_user = insert_user(&mut *tx, &user).await?;
        let new_account = insert_account(&mut *tx, new_user.id, &account).await?;

        tx.commit().await?;

        Ok((new_user, new_account))
    }

    async fn list_users(&self, page: Pagination) -> Result<Vec<User>, AppError> {
        let (limit, offset) = page.limit_offset();
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid], page: Pagination) -> Result<Vec<User>, AppError> {
        let (limit, offset) = page.limit_offset();
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_user_with_account(
        &self,
        id: Uuid,
        user: UserChanges,
        account: AccountChanges,
    ) -> Result<(User, Option<Account>), AppError> {
        let mut tx = self.pool.begin().await?;

        let updated_user = update_user(&mut *tx, id, &user)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let updated_account = if account.is_empty() {
            select_account_by_user_id(&mut *tx, id).await?
        } else {
            let acc = update_account(&mut *tx, id, &account)
                .await?
                .ok_or_else(|| AppError::InvalidInput(format!("user {} has no account", id)))?;
            Some(acc)
        };

        tx.commit().await?;

        Ok((updated_user, updated_account))
    }

    async fn set_account_status(&self, user_id: Uuid, status: AccountStatus) -> Result<Account, AppError> {
        let changes = AccountChanges {
            status: Some(status),
            ..Default::default()
        };
        update_account(&self.pool, user_id, &changes)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Dependent row first.
        sqlx::query("DELETE FROM accounts WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
