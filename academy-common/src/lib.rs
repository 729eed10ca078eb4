//! # Academy Common Library
//!
//! Shared code for the academy administration backend:
//! - Error type used across crates
//! - Bootstrap configuration loading (TOML + environment overrides)
//! - Database initialization and row models

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
