use crate::{
    api::handlers::auth::{AdminAccount, PasswordHasher, ProvisionOutcome, create_super_admin},
    cli::commands::{create_admin, database},
    db::{self, InitPolicy},
};
use anyhow::Result;
use secrecy::ExposeSecret;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub database: database::Options,
    pub admin: create_admin::Options,
}

/// Create the first super admin. Schema creation always fails fast here.
/// # Errors
/// Returns an error if the database is unreachable or the account is rejected.
pub async fn execute(args: Args) -> Result<()> {
    let Args { database, admin } = args;

    let pool = db::connect(&database.url, &database.pool)?;
    db::initialize(&pool, database.url.backend(), InitPolicy::FailFast).await?;

    let account = AdminAccount {
        email: admin.email,
        username: admin.username,
        password: admin.password.expose_secret().to_string(),
        first_name: admin.first_name,
        last_name: admin.last_name,
    };

    let outcome = create_super_admin(&pool, &PasswordHasher::default(), &account).await;
    pool.close().await;

    match outcome? {
        ProvisionOutcome::Created { user_id, email } => {
            info!(user_id, email = %email, "super admin created");
            println!("Super admin created: {email} (id {user_id})");
        }
        ProvisionOutcome::AlreadyExists { email } => {
            warn!(email = %email, "super admin already exists; nothing written");
            println!("Super admin already exists: {email}");
        }
    }

    Ok(())
}
