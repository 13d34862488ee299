//! Rollwise Server Library
//!
//! Core functionality for the Rollwise backend:
//! - SQLite storage for users and decision records
//! - Daily quota ledger gating AI generation (premium bypass)
//! - Alternative generator with provider fallback
//! - Exactly-once randomized decision resolution
//! - HTTP/JSON API with bearer-token auth

pub mod api;
pub mod auth;
pub mod decision;
pub mod generator;
pub mod quota;
pub mod storage;
