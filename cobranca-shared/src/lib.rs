//! # Cobrança Shared Library
//!
//! This crate contains the types, persistence and authentication logic used by
//! the Cobrança API server.
//!
//! ## Module Organization
//!
//! - `auth`: Token service, password hashing and the authentication gate
//! - `db`: Connection pool and migrations
//! - `models`: Users, customers and charges with their SQL and business rules

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Cobrança shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
