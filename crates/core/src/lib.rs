//! Ellectra Core - Shared domain types.
//!
//! This crate provides the types used across all Ellectra components:
//! - `storefront` - The storefront API server
//! - `cli` - Command-line tools for migrations, seeding and tokens
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Id generation takes the random source as a
//! parameter so it stays deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Prefixed ids, prices, emails, statuses and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
