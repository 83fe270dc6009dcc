//! Shared types, auth claims, and configuration for Cashbook.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - JWT claims and token service for the access gate
//! - Configuration management

pub mod auth;
pub mod config;
pub mod jwt;
pub mod types;


pub use auth::Claims;
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
