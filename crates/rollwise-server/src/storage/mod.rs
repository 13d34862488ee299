//! `SQLite` storage for the Rollwise server.
//!
//! Provides persistence for users (quota state) and decisions.

mod db;
mod models;
mod queries;
mod quota_queries;

pub use db::{Database, DatabaseError};
pub use models::*;
