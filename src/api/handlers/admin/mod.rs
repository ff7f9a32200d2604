//! Super-admin console.
//!
//! Every route here sits behind [`SessionGuard::super_admin`], which also
//! places the caller's [`Principal`] in the request extensions.
//!
//! [`SessionGuard::super_admin`]: super::auth::SessionGuard::super_admin
//! [`Principal`]: super::auth::Principal

pub(crate) mod institutions;
pub(crate) mod pagination;
pub(crate) mod stats;
mod storage;
pub(crate) mod types;
pub(crate) mod users;

pub use pagination::{PageRequest, Pagination};
