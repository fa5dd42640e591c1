//! Token validation strategies
//!
//! Both strategies turn decoded claims into a fresh [`Identity`] by reading
//! the account row. Nothing is cached between requests; every failure is a
//! terminal 401.

use std::fmt;

use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{derive_faculty_roles, Identity, Role, UserType};
use crate::db::row_parsers;
use crate::errors::{AppError, AppResult};
use crate::jwt::Claims;
use crate::utils::{utc_now, verify_password};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the exact value `ACTIVE` is active. Any other stored status
/// (GRADUATED, SUSPENDED, ...) reads as inactive.
impl From<&str> for AccountStatus {
    fn from(value: &str) -> Self {
        match value {
            "ACTIVE" => AccountStatus::Active,
            _ => AccountStatus::Inactive,
        }
    }
}

/// Credential-bearing view of a student or faculty member row.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: Uuid,
    pub user_type: UserType,
    pub faculty_id: Option<Uuid>,
    pub status: AccountStatus,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
}

impl AccountRecord {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

fn account_table(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Student => "students",
        UserType::Faculty => "faculty_members",
    }
}

fn account_from_row(row: &SqliteRow, user_type: UserType) -> AppResult<AccountRecord> {
    use sqlx::Row;

    Ok(AccountRecord {
        id: row_parsers::uuid(row, "id")?,
        user_type,
        faculty_id: row_parsers::opt_uuid(row, "faculty_id")?,
        status: AccountStatus::from(row.try_get::<String, _>("status")?.as_str()),
        password_hash: row.try_get("password_hash")?,
        refresh_token_hash: row.try_get("refresh_token_hash")?,
    })
}

pub async fn find_account_by_id(
    pool: &SqlitePool,
    user_type: UserType,
    id: Uuid,
) -> AppResult<Option<AccountRecord>> {
    let sql = format!(
        "SELECT id, faculty_id, status, password_hash, refresh_token_hash FROM {} WHERE id = ?",
        account_table(user_type)
    );

    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| account_from_row(&r, user_type)).transpose()
}

pub async fn find_account_by_email(
    pool: &SqlitePool,
    user_type: UserType,
    email: &str,
) -> AppResult<Option<AccountRecord>> {
    let sql = format!(
        "SELECT id, faculty_id, status, password_hash, refresh_token_hash FROM {} WHERE lower(email) = lower(?)",
        account_table(user_type)
    );

    let row = sqlx::query(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

    row.map(|r| account_from_row(&r, user_type)).transpose()
}

/// Basic roles from the join table plus `HEAD` inferred from division rows.
pub async fn load_faculty_roles(pool: &SqlitePool, faculty_member_id: Uuid) -> AppResult<Vec<Role>> {
    let basic: Vec<String> =
        sqlx::query_scalar("SELECT role FROM faculty_member_roles WHERE faculty_member_id = ? ORDER BY rowid")
            .bind(faculty_member_id.to_string())
            .fetch_all(pool)
            .await?;

    let division_roles: Vec<String> =
        sqlx::query_scalar("SELECT role FROM division_memberships WHERE faculty_member_id = ?")
            .bind(faculty_member_id.to_string())
            .fetch_all(pool)
            .await?;

    let basic_roles = basic.iter().filter_map(|name| match name.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            tracing::warn!(%faculty_member_id, role = %name, "ignoring unknown role");
            None
        }
    });

    Ok(derive_faculty_roles(basic_roles, division_roles.iter().map(String::as_str)))
}

pub async fn build_identity(pool: &SqlitePool, account: &AccountRecord) -> AppResult<Identity> {
    match account.user_type {
        UserType::Student => Ok(Identity::student(account.id, account.faculty_id)),
        UserType::Faculty => {
            let roles = load_faculty_roles(pool, account.id).await?;
            Ok(Identity::faculty(account.id, roles, account.faculty_id))
        }
    }
}

async fn active_account(pool: &SqlitePool, claims: &Claims) -> AppResult<AccountRecord> {
    let account = find_account_by_id(pool, claims.user_type, claims.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("account not found"))?;

    if !account.is_active() {
        tracing::debug!(user_id = %claims.id, user_type = %claims.user_type, "inactive account rejected");
        return Err(AppError::unauthorized("account is not active"));
    }

    Ok(account)
}

/// Access-token strategy.
pub async fn validate_access(pool: &SqlitePool, claims: &Claims) -> AppResult<Identity> {
    let account = active_account(pool, claims).await?;
    build_identity(pool, &account).await
}

/// Refresh-token strategy: the presented token must match the stored hash.
pub async fn validate_refresh(pool: &SqlitePool, claims: &Claims, presented: &str) -> AppResult<Identity> {
    let account = active_account(pool, claims).await?;

    let stored = account
        .refresh_token_hash
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("no active session"))?;

    let matches = verify_password(presented, stored).unwrap_or_else(|err| {
        tracing::warn!(user_id = %claims.id, error = %err, "stored refresh token hash is unreadable");
        false
    });
    if !matches {
        tracing::debug!(user_id = %claims.id, "refresh token mismatch");
        return Err(AppError::unauthorized("refresh token mismatch"));
    }

    build_identity(pool, &account).await
}

/// Stores (or clears, with `None`) the hashed refresh token of an account.
pub async fn store_refresh_hash(
    pool: &SqlitePool,
    user_type: UserType,
    id: Uuid,
    hash: Option<&str>,
) -> AppResult<()> {
    let sql = format!(
        "UPDATE {} SET refresh_token_hash = ?, updated_at = ? WHERE id = ?",
        account_table(user_type)
    );

    sqlx::query(&sql)
        .bind(hash)
        .bind(utc_now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
