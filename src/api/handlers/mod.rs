//! Route handlers.
//!
//! `auth` owns login and the session model, `admin` the super-admin console.
//! The remaining modules are unauthenticated diagnostics and static data.

pub mod admin;
pub mod auth;
pub mod colleges;
pub mod health;
pub mod root;
