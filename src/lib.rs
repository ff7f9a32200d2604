//! # Alumna (Alumni Management Platform API)
//!
//! `alumna` is the backend for a multi-tenant alumni platform. It serves the
//! universal login used by every dashboard, the super-admin console, and a set
//! of diagnostics endpoints used by the hosting platform.
//!
//! ## Roles and Capabilities
//!
//! Every account carries exactly one role (`super_admin`, `admin`, `alumni`,
//! `student`). A role maps to a fixed table of seven capabilities that the
//! frontend uses to decide which panels to render. Unknown role strings map to
//! an all-false table.
//!
//! ## Sessions
//!
//! Sessions are server-side and process-local. The browser only holds an
//! opaque random token in the `alumna_session` cookie; the server keys its
//! records by a digest of that token and the configured secret key. A session
//! caches the role seen at login, so a role change applies on the next login.
//!
//! ## Storage
//!
//! Users and institutions live in Postgres when `POSTGRES_URL` is set and in a
//! local SQLite file otherwise. Both backends share one query path through the
//! `sqlx` `Any` driver.

pub mod api;
pub mod cli;
pub mod db;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
