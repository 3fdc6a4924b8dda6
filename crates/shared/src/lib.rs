//! Shared types, errors, and configuration for Darkroom.
//!
//! This crate provides common types used across all other crates:
//! - Media kind classification and known extension sets
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
