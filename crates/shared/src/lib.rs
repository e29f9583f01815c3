#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Clinic Shared Module
//!
//! Types and database plumbing used by both the API server and the billing crate.

pub mod db;
pub mod env;
pub mod subscription;

pub use db::{create_pool, run_migrations, DatabaseConfig};
pub use subscription::{Plan, PlanParseError, UserSubscription};
