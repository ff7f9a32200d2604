//! Database helpers for accounts.

use anyhow::{Context, Result};
use sqlx::{AnyPool, Row, any::AnyRow};
use tracing::Instrument;

use crate::db::now_rfc3339;

pub(crate) const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, role, status, institution_id, created_at";

/// Full account row, including the password hash.
#[derive(Clone, Debug)]
pub(crate) struct UserRecord {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) role: String,
    pub(crate) status: String,
    pub(crate) institution_id: Option<i64>,
    pub(crate) created_at: String,
}

impl UserRecord {
    pub(crate) fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: row.try_get("role")?,
            status: row.try_get("status")?,
            institution_id: row.try_get("institution_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Values for a new account; the password is already hashed.
#[derive(Debug)]
pub(crate) struct NewUser<'a> {
    pub(crate) email: &'a str,
    pub(crate) username: &'a str,
    pub(crate) password_hash: &'a str,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) role: &'a str,
    pub(crate) status: &'a str,
    pub(crate) institution_id: Option<i64>,
}

#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Created(UserRecord),
    Conflict,
}

pub(crate) async fn find_user_by_email(pool: &AnyPool, email: &str) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = %query);
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    row.as_ref()
        .map(UserRecord::from_row)
        .transpose()
        .context("failed to decode user row")
}

pub(crate) async fn email_taken(pool: &AnyPool, email: &str) -> Result<bool> {
    exists(pool, "SELECT id FROM users WHERE email = $1", email).await
}

pub(crate) async fn username_taken(pool: &AnyPool, username: &str) -> Result<bool> {
    exists(pool, "SELECT id FROM users WHERE username = $1", username).await
}

/// Email of the oldest super admin account, if any.
pub(crate) async fn first_super_admin_email(pool: &AnyPool) -> Result<Option<String>> {
    let query = "SELECT email FROM users WHERE role = $1 ORDER BY id ASC LIMIT 1";
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let row = sqlx::query(query)
        .bind("super_admin")
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup super admin")?;
    row.map(|row| row.try_get::<String, _>("email"))
        .transpose()
        .context("failed to decode super admin email")
}

async fn exists(pool: &AnyPool, query: &str, value: &str) -> Result<bool> {
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let row = sqlx::query(query)
        .bind(value)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check for existing row")?;
    Ok(row.is_some())
}

/// Insert an account; a uniqueness race is reported as [`InsertOutcome::Conflict`].
pub(crate) async fn insert_user(pool: &AnyPool, user: &NewUser<'_>) -> Result<InsertOutcome> {
    let now = now_rfc3339();
    let query = format!(
        r"
        INSERT INTO users
            (email, username, password_hash, first_name, last_name, role, status,
             institution_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!("db.query", db.operation = "INSERT", db.statement = %query);
    let result = sqlx::query(&query)
        .bind(user.email)
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role)
        .bind(user.status)
        .bind(user.institution_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match result {
        Ok(row) => Ok(InsertOutcome::Created(
            UserRecord::from_row(&row).context("failed to decode inserted user")?,
        )),
        Err(err) if crate::db::is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Backend, DatabaseUrl, InitPolicy, PoolSettings, connect, initialize};

    async fn pool() -> Result<AnyPool> {
        let pool = connect(&DatabaseUrl::sqlite_memory(), &PoolSettings::default())?;
        initialize(&pool, Backend::Sqlite, InitPolicy::FailFast).await?;
        Ok(pool)
    }

    fn new_user<'a>(email: &'a str, username: &'a str, role: &'a str) -> NewUser<'a> {
        NewUser {
            email,
            username,
            password_hash: "$argon2id$stub",
            first_name: "Ada",
            last_name: "Lovelace",
            role,
            status: "active",
            institution_id: None,
        }
    }

    #[tokio::test]
    async fn insert_and_lookup() -> Result<()> {
        let pool = pool().await?;
        let InsertOutcome::Created(user) =
            insert_user(&pool, &new_user("ada@example.com", "ada", "alumni")).await?
        else {
            anyhow::bail!("expected insert to succeed");
        };
        assert_eq!(user.institution_id, None);

        let by_email = find_user_by_email(&pool, "ada@example.com").await?;
        assert_eq!(
            by_email.map(|u| (u.id, u.username)),
            Some((user.id, "ada".to_string()))
        );
        assert!(find_user_by_email(&pool, "nobody@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() -> Result<()> {
        let pool = pool().await?;
        insert_user(&pool, &new_user("ada@example.com", "ada", "alumni")).await?;
        let outcome = insert_user(&pool, &new_user("ada@example.com", "other", "alumni")).await?;
        assert!(matches!(outcome, InsertOutcome::Conflict));
        let outcome = insert_user(&pool, &new_user("other@example.com", "ada", "alumni")).await?;
        assert!(matches!(outcome, InsertOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn existence_checks() -> Result<()> {
        let pool = pool().await?;
        assert_eq!(first_super_admin_email(&pool).await?, None);
        insert_user(&pool, &new_user("root@example.com", "root", "super_admin")).await?;
        assert_eq!(
            first_super_admin_email(&pool).await?.as_deref(),
            Some("root@example.com")
        );
        assert!(email_taken(&pool, "root@example.com").await?);
        assert!(username_taken(&pool, "root").await?);
        assert!(!username_taken(&pool, "ada").await?);
        Ok(())
    }
}
