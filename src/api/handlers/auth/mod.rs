//! Authentication, sessions and role gating.
//!
//! Login checks an email/password pair against the account store and issues
//! an opaque token in the `alumna_session` cookie. The server keeps the
//! session record (user id, email, role seen at login) in a process-local
//! store keyed by a keyed digest of the token.
//!
//! ## Capabilities
//!
//! Each role maps to a fixed table of seven capabilities. The table is
//! returned on login and on `/api/session` so the frontend can decide which
//! panels to show; authorization on the server is done by [`SessionGuard`].

pub(crate) mod guard;
pub(crate) mod login;
mod password;
pub(crate) mod principal;
mod provision;
pub(crate) mod roles;
pub(crate) mod session;
mod state;
pub(crate) mod storage;
mod store;
pub(crate) mod types;
pub(crate) mod utils;

pub use guard::{SessionGuard, require_role};
pub use password::{PasswordHasher, verify_password};
pub use principal::Principal;
pub use provision::{AdminAccount, ProvisionOutcome, create_super_admin};
pub use roles::{Permissions, Role, Status, dashboard_for, permissions_for};
pub use state::{AuthConfig, AuthState, DEFAULT_SECRET_KEY};
pub use store::{SessionRecord, SessionStore};
