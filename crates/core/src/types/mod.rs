//! Core types for Ellectra.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pagination;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{Page, PageError, PageInfo, PageRequest};
pub use price::{MAX_AMOUNT, Price, PriceError, checked_amount_add};
pub use status::*;
