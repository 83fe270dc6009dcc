//! Core business logic for Cashbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `cash` - Daily cash-register ledger: day lifecycle, movements, summaries

pub mod cash;
