//! Queries behind the super-admin console.
//!
//! Filters are rendered into a `WHERE` clause with numbered placeholders so
//! the same text runs on Postgres and SQLite. A placeholder may appear more
//! than once; both backends bind it to the same value.

use anyhow::{Context, Result};
use sqlx::{AnyPool, Row, any::AnyRow};
use tracing::Instrument;

use super::{
    pagination::PageRequest,
    types::{InstitutionView, UserStats},
};
use crate::api::handlers::auth::{
    Role, Status,
    storage::{USER_COLUMNS, UserRecord},
};
use crate::db::{is_unique_violation, now_rfc3339};

#[derive(Debug, Default)]
pub(crate) struct UserFilter {
    pub(crate) search: Option<String>,
    pub(crate) role: Option<Role>,
}

impl UserFilter {
    fn clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        if let Some(search) = &self.search {
            binds.push(like_pattern(search));
            conditions.push(any_column_like(
                &["email", "username", "first_name", "last_name"],
                binds.len(),
            ));
        }
        if let Some(role) = self.role {
            binds.push(role.as_str().to_string());
            conditions.push(format!("role = ${}", binds.len()));
        }
        (where_clause(&conditions), binds)
    }
}

#[derive(Debug, Default)]
pub(crate) struct InstitutionFilter {
    pub(crate) search: Option<String>,
    pub(crate) status: Option<Status>,
}

impl InstitutionFilter {
    fn clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        if let Some(search) = &self.search {
            binds.push(like_pattern(search));
            conditions.push(any_column_like(
                &["i.name", "i.location", "i.institution_type"],
                binds.len(),
            ));
        }
        if let Some(status) = self.status {
            binds.push(status.as_str().to_string());
            conditions.push(format!("i.status = ${}", binds.len()));
        }
        (where_clause(&conditions), binds)
    }
}

/// Lower-cased `%term%` pattern with LIKE wildcards escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn any_column_like(columns: &[&str], placeholder: usize) -> String {
    let parts: Vec<String> = columns
        .iter()
        .map(|column| format!(r"LOWER({column}) LIKE ${placeholder} ESCAPE '\'"))
        .collect();
    format!("({})", parts.join(" OR "))
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

async fn fetch_count(pool: &AnyPool, query: &str, binds: &[String]) -> Result<i64> {
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let mut statement = sqlx::query(query);
    for value in binds {
        statement = statement.bind(value.as_str());
    }
    let row = statement
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count rows")?;
    row.try_get::<i64, _>("total")
        .context("failed to decode row count")
}

pub(crate) async fn count_users(pool: &AnyPool, filter: &UserFilter) -> Result<i64> {
    let (clause, binds) = filter.clause();
    let query = format!("SELECT COUNT(*) AS total FROM users{clause}");
    fetch_count(pool, &query, &binds).await
}

pub(crate) async fn list_users(
    pool: &AnyPool,
    filter: &UserFilter,
    page: PageRequest,
) -> Result<Vec<UserRecord>> {
    let (clause, binds) = filter.clause();
    let limit = binds.len() + 1;
    let offset = binds.len() + 2;
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users{clause} ORDER BY id ASC LIMIT ${limit} OFFSET ${offset}"
    );
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = %query);
    let mut statement = sqlx::query(&query);
    for value in &binds {
        statement = statement.bind(value.as_str());
    }
    let rows = statement
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list users")?;

    rows.iter()
        .map(UserRecord::from_row)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode user rows")
}

pub(crate) async fn user_stats(pool: &AnyPool) -> Result<UserStats> {
    let query = "SELECT role, COUNT(*) AS total FROM users GROUP BY role";
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to count users by role")?;

    let mut stats = UserStats::default();
    for row in &rows {
        let role: String = row.try_get("role").context("failed to decode role")?;
        let total: i64 = row.try_get("total").context("failed to decode count")?;
        stats.total += total;
        match Role::parse(&role) {
            Some(Role::SuperAdmin) => stats.super_admins += total,
            Some(Role::Admin) => stats.admins += total,
            Some(Role::Alumni) => stats.alumni += total,
            Some(Role::Student) => stats.students += total,
            None => {}
        }
    }

    stats.active = fetch_count(
        pool,
        "SELECT COUNT(*) AS total FROM users WHERE status = $1",
        &[Status::Active.as_str().to_string()],
    )
    .await?;

    Ok(stats)
}

pub(crate) async fn update_user_column(
    pool: &AnyPool,
    user_id: i64,
    column: UserColumn,
    value: &str,
) -> Result<Option<UserRecord>> {
    let query = format!(
        "UPDATE users SET {} = $1, updated_at = $2 WHERE id = $3 RETURNING {USER_COLUMNS}",
        column.as_str()
    );
    let span = tracing::info_span!("db.query", db.operation = "UPDATE", db.statement = %query);
    let row = sqlx::query(&query)
        .bind(value)
        .bind(now_rfc3339())
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update user")?;

    row.as_ref()
        .map(UserRecord::from_row)
        .transpose()
        .context("failed to decode user row")
}

/// Columns an administrator may change in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UserColumn {
    Role,
    Status,
}

impl UserColumn {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Status => "status",
        }
    }
}

const INSTITUTION_COLUMNS: &str = r"
    i.id, i.name, i.institution_type, i.location, i.status, i.created_at,
    (SELECT COUNT(*) FROM users u WHERE u.institution_id = i.id AND u.role = 'admin') AS admin_count,
    (SELECT COUNT(*) FROM users u WHERE u.institution_id = i.id AND u.role = 'student') AS student_count,
    (SELECT COUNT(*) FROM users u WHERE u.institution_id = i.id AND u.role = 'alumni') AS alumni_count
";

fn institution_from_row(row: &AnyRow) -> Result<InstitutionView, sqlx::Error> {
    Ok(InstitutionView {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        institution_type: row.try_get("institution_type")?,
        location: row.try_get("location")?,
        status: row.try_get("status")?,
        admin_count: row.try_get("admin_count")?,
        student_count: row.try_get("student_count")?,
        alumni_count: row.try_get("alumni_count")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) async fn count_institutions(pool: &AnyPool, filter: &InstitutionFilter) -> Result<i64> {
    let (clause, binds) = filter.clause();
    let query = format!("SELECT COUNT(*) AS total FROM institutions i{clause}");
    fetch_count(pool, &query, &binds).await
}

pub(crate) async fn list_institutions(
    pool: &AnyPool,
    filter: &InstitutionFilter,
    page: PageRequest,
) -> Result<Vec<InstitutionView>> {
    let (clause, binds) = filter.clause();
    let limit = binds.len() + 1;
    let offset = binds.len() + 2;
    let query = format!(
        "SELECT {INSTITUTION_COLUMNS} FROM institutions i{clause} ORDER BY i.id ASC LIMIT ${limit} OFFSET ${offset}"
    );
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = %query);
    let mut statement = sqlx::query(&query);
    for value in &binds {
        statement = statement.bind(value.as_str());
    }
    let rows = statement
        .bind(page.per_page())
        .bind(page.offset())
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list institutions")?;

    rows.iter()
        .map(institution_from_row)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode institution rows")
}

pub(crate) async fn institution_exists(pool: &AnyPool, id: i64) -> Result<bool> {
    let query = "SELECT id FROM institutions WHERE id = $1";
    let span = tracing::info_span!("db.query", db.operation = "SELECT", db.statement = query);
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup institution")?;
    Ok(row.is_some())
}

#[derive(Debug)]
pub(crate) struct NewInstitution<'a> {
    pub(crate) name: &'a str,
    pub(crate) institution_type: &'a str,
    pub(crate) location: &'a str,
    pub(crate) status: Status,
}

#[derive(Debug)]
pub(crate) enum InstitutionOutcome {
    Created(InstitutionView),
    Conflict,
}

pub(crate) async fn insert_institution(
    pool: &AnyPool,
    institution: &NewInstitution<'_>,
) -> Result<InstitutionOutcome> {
    let query = r"
        INSERT INTO institutions (name, institution_type, location, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let span = tracing::info_span!("db.query", db.operation = "INSERT", db.statement = query);
    let result = sqlx::query(query)
        .bind(institution.name)
        .bind(institution.institution_type)
        .bind(institution.location)
        .bind(institution.status.as_str())
        .bind(now_rfc3339())
        .fetch_one(pool)
        .instrument(span)
        .await;

    let id: i64 = match result {
        Ok(row) => row.try_get("id").context("failed to decode institution id")?,
        Err(err) if is_unique_violation(&err) => return Ok(InstitutionOutcome::Conflict),
        Err(err) => return Err(err).context("failed to insert institution"),
    };

    let query = format!("SELECT {INSTITUTION_COLUMNS} FROM institutions i WHERE i.id = $1");
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_one(pool)
        .await
        .context("failed to reload institution")?;
    let view = institution_from_row(&row).context("failed to decode institution row")?;
    Ok(InstitutionOutcome::Created(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::storage::{NewUser, insert_user};
    use crate::db::{Backend, DatabaseUrl, InitPolicy, PoolSettings, connect, initialize};

    async fn pool() -> Result<AnyPool> {
        let pool = connect(&DatabaseUrl::sqlite_memory(), &PoolSettings::default())?;
        initialize(&pool, Backend::Sqlite, InitPolicy::FailFast).await?;
        Ok(pool)
    }

    async fn seed_user(
        pool: &AnyPool,
        email: &str,
        username: &str,
        role: &str,
        institution_id: Option<i64>,
    ) -> Result<()> {
        insert_user(
            pool,
            &NewUser {
                email,
                username,
                password_hash: "$argon2id$stub",
                first_name: "First",
                last_name: "Last",
                role,
                status: "active",
                institution_id,
            },
        )
        .await?;
        Ok(())
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ada"), "%ada%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn clause_numbers_placeholders() {
        let filter = UserFilter {
            search: Some("x".to_string()),
            role: Some(Role::Admin),
        };
        let (clause, binds) = filter.clause();
        assert!(clause.contains("LOWER(email) LIKE $1"));
        assert!(clause.contains("role = $2"));
        assert_eq!(binds, vec!["%x%".to_string(), "admin".to_string()]);
        assert_eq!(UserFilter::default().clause().0, "");
    }

    #[tokio::test]
    async fn search_and_role_filter() -> Result<()> {
        let pool = pool().await?;
        seed_user(&pool, "ada@example.com", "ada", "alumni", None).await?;
        seed_user(&pool, "grace@example.com", "grace", "student", None).await?;
        seed_user(&pool, "alan@example.com", "ADA_fan", "student", None).await?;

        let filter = UserFilter {
            search: Some("ADA".to_string()),
            role: None,
        };
        assert_eq!(count_users(&pool, &filter).await?, 2);

        let filter = UserFilter {
            search: Some("ada".to_string()),
            role: Some(Role::Student),
        };
        let users = list_users(&pool, &filter, PageRequest::default()).await?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "ADA_fan");

        let filter = UserFilter {
            search: Some("_".to_string()),
            role: None,
        };
        assert_eq!(count_users(&pool, &filter).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn list_pages_in_id_order() -> Result<()> {
        let pool = pool().await?;
        for n in 0..5 {
            seed_user(&pool, &format!("u{n}@example.com"), &format!("u{n}"), "student", None)
                .await?;
        }
        let page = PageRequest::from_params(Some("2"), Some("2"));
        let users = list_users(&pool, &UserFilter::default(), page).await?;
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["u2", "u3"]);
        Ok(())
    }

    #[tokio::test]
    async fn stats_count_roles() -> Result<()> {
        let pool = pool().await?;
        seed_user(&pool, "root@example.com", "root", "super_admin", None).await?;
        seed_user(&pool, "a@example.com", "a", "admin", None).await?;
        seed_user(&pool, "s@example.com", "s", "student", None).await?;
        update_user_column(&pool, 3, UserColumn::Status, "inactive").await?;

        let stats = user_stats(&pool).await?;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.super_admins, 1);
        assert_eq!(stats.admins, 1);
        assert_eq!(stats.students, 1);
        assert_eq!(stats.alumni, 0);
        assert_eq!(stats.active, 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_user_returns_none() -> Result<()> {
        let pool = pool().await?;
        assert!(update_user_column(&pool, 42, UserColumn::Role, "admin").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn institutions_derive_counts() -> Result<()> {
        let pool = pool().await?;
        let outcome = insert_institution(
            &pool,
            &NewInstitution {
                name: "Sample University",
                institution_type: "University",
                location: "New Delhi",
                status: Status::Active,
            },
        )
        .await?;
        let InstitutionOutcome::Created(created) = outcome else {
            anyhow::bail!("expected institution to be created");
        };
        assert!(institution_exists(&pool, created.id).await?);
        assert!(!institution_exists(&pool, created.id + 1).await?);

        seed_user(&pool, "a@example.com", "a", "admin", Some(created.id)).await?;
        seed_user(&pool, "s1@example.com", "s1", "student", Some(created.id)).await?;
        seed_user(&pool, "s2@example.com", "s2", "student", Some(created.id)).await?;
        seed_user(&pool, "x@example.com", "x", "alumni", None).await?;

        let filter = InstitutionFilter {
            search: Some("delhi".to_string()),
            status: Some(Status::Active),
        };
        assert_eq!(count_institutions(&pool, &filter).await?, 1);
        let list = list_institutions(&pool, &filter, PageRequest::default()).await?;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].admin_count, 1);
        assert_eq!(list[0].student_count, 2);
        assert_eq!(list[0].alumni_count, 0);

        let duplicate = insert_institution(
            &pool,
            &NewInstitution {
                name: "Sample University",
                institution_type: "College",
                location: "Mumbai",
                status: Status::Active,
            },
        )
        .await?;
        assert!(matches!(duplicate, InstitutionOutcome::Conflict));
        Ok(())
    }
}
