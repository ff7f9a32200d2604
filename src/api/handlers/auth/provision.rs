//! First super admin account, created from the command line.

use anyhow::{Result, bail};
use sqlx::AnyPool;
use tracing::info;

use super::{
    password::PasswordHasher,
    roles::{Role, Status},
    storage::{
        InsertOutcome, NewUser, email_taken, first_super_admin_email, insert_user, username_taken,
    },
    utils::{normalize_email, valid_email},
};

#[derive(Debug)]
pub struct AdminAccount {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { user_id: i64, email: String },
    /// Nothing was written because a super admin is already present.
    AlreadyExists { email: String },
}

/// Create the first `super_admin` account unless one already exists.
///
/// # Errors
/// Fails on invalid input, an email or username that is taken, or a storage error.
pub async fn create_super_admin(
    pool: &AnyPool,
    hasher: &PasswordHasher,
    account: &AdminAccount,
) -> Result<ProvisionOutcome> {
    if let Some(email) = first_super_admin_email(pool).await? {
        return Ok(ProvisionOutcome::AlreadyExists { email });
    }

    let email = normalize_email(&account.email);
    let username = account.username.trim();
    if !valid_email(&email) {
        bail!("Invalid email format: {email}");
    }
    if username.is_empty() {
        bail!("username is required");
    }
    if account.password.is_empty() {
        bail!("password is required");
    }
    if email_taken(pool, &email).await? {
        bail!("User with this email already exists");
    }
    if username_taken(pool, username).await? {
        bail!("Username already taken");
    }

    let password_hash = hasher.hash(&account.password)?;
    let outcome = insert_user(
        pool,
        &NewUser {
            email: &email,
            username,
            password_hash: &password_hash,
            first_name: account.first_name.trim(),
            last_name: account.last_name.trim(),
            role: Role::SuperAdmin.as_str(),
            status: Status::Active.as_str(),
            institution_id: None,
        },
    )
    .await?;

    match outcome {
        InsertOutcome::Created(user) => {
            info!(user_id = user.id, "super admin created");
            Ok(ProvisionOutcome::Created {
                user_id: user.id,
                email: user.email,
            })
        }
        InsertOutcome::Conflict => bail!("User with this email or username already exists"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Backend, DatabaseUrl, InitPolicy, PoolSettings, connect, initialize};

    fn account(email: &str, username: &str) -> AdminAccount {
        AdminAccount {
            email: email.to_string(),
            username: username.to_string(),
            password: "Generic.Pass@0012".to_string(),
            first_name: "Super".to_string(),
            last_name: "Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_once() -> Result<()> {
        let pool = connect(&DatabaseUrl::sqlite_memory(), &PoolSettings::default())?;
        initialize(&pool, Backend::Sqlite, InitPolicy::FailFast).await?;
        let hasher = PasswordHasher::with_params(256, 1, 1)?;

        let first = create_super_admin(&pool, &hasher, &account(" Root@Example.com", "root")).await?;
        assert!(matches!(
            first,
            ProvisionOutcome::Created { ref email, .. } if email == "root@example.com"
        ));

        let second = create_super_admin(&pool, &hasher, &account("other@example.com", "other")).await?;
        assert_eq!(
            second,
            ProvisionOutcome::AlreadyExists {
                email: "root@example.com".to_string()
            }
        );
        assert!(!email_taken(&pool, "other@example.com").await?);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_invalid_email() -> Result<()> {
        let pool = connect(&DatabaseUrl::sqlite_memory(), &PoolSettings::default())?;
        initialize(&pool, Backend::Sqlite, InitPolicy::FailFast).await?;
        let hasher = PasswordHasher::with_params(256, 1, 1)?;
        assert!(create_super_admin(&pool, &hasher, &account("not-an-email", "root")).await.is_err());
        Ok(())
    }
}
