//! Prefixed, human-readable entity identifiers.
//!
//! Every entity id is a short string made of a fixed prefix and a random
//! suffix (`USER482913`, `ORD3FA9C1`). The `define_id!` macro creates a
//! distinct newtype per entity so ids of different kinds cannot be mixed up.
//!
//! Suffixes come from a small space, so generation checks candidates against
//! the set of ids already in use and retries on collision. Storage still
//! enforces uniqueness through its primary key.

use std::collections::HashSet;
use std::hash::Hash;

use rand::Rng;

/// Upper bound on collision retries before generation gives up.
pub const MAX_GENERATION_ATTEMPTS: usize = 1_000;

/// Errors from id generation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Every candidate drawn collided with an existing id.
    #[error("could not generate a unique {prefix} id after {attempts} attempts")]
    Exhausted {
        /// Prefix of the id kind being generated.
        prefix: &'static str,
        /// Number of candidates tried.
        attempts: usize,
    },
}

/// Shape of the random part of an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSuffix {
    /// Six decimal digits in `100000..=999999`.
    Digits,
    /// Six uppercase hexadecimal characters.
    Hex,
}

impl IdSuffix {
    /// Draw a random suffix of this shape.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        match self {
            Self::Digits => rng.random_range(100_000..=999_999_u32).to_string(),
            Self::Hex => format!("{:06X}", rng.random_range(0..=0x00FF_FFFF_u32)),
        }
    }
}

/// Draw candidates until one is absent from `existing`.
///
/// # Errors
///
/// Returns [`IdError::Exhausted`] after [`MAX_GENERATION_ATTEMPTS`] collisions.
pub fn generate_unique<T, R, F>(
    prefix: &'static str,
    existing: &HashSet<T>,
    rng: &mut R,
    mut candidate: F,
) -> Result<T, IdError>
where
    T: Eq + Hash,
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> T,
{
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let id = candidate(rng);
        if !existing.contains(&id) {
            return Ok(id);
        }
    }
    Err(IdError::Exhausted {
        prefix,
        attempts: MAX_GENERATION_ATTEMPTS,
    })
}

/// Macro to define a prefixed string id.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `PREFIX`/`SUFFIX` constants and `generate()`/`generate_unique()`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use ellectra_core::{define_id, IdSuffix};
/// define_id!(TicketId, "TCK", IdSuffix::Digits);
///
/// let id = TicketId::generate(&mut rand::rng());
/// assert!(id.as_str().starts_with("TCK"));
/// assert_eq!(id.as_str().len(), 9);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal, $suffix:expr) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fixed leading characters of every id of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Shape of the random part.
            pub const SUFFIX: $crate::IdSuffix = $suffix;

            /// Wrap an existing id value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the id and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Draw a fresh id without checking for collisions.
            pub fn generate<R: ::rand::Rng + ?Sized>(rng: &mut R) -> Self {
                Self(format!("{}{}", Self::PREFIX, Self::SUFFIX.sample(rng)))
            }

            /// Draw a fresh id that is not in `existing`.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Exhausted` when no free id was found.
            pub fn generate_unique<R: ::rand::Rng + ?Sized>(
                existing: &::std::collections::HashSet<Self>,
                rng: &mut R,
            ) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::types::id::generate_unique(Self::PREFIX, existing, rng, |rng| Self::generate(rng))
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }
    };
}

define_id!(UserId, "USER", IdSuffix::Digits);
define_id!(CategoryId, "CAT", IdSuffix::Digits);
define_id!(ProductId, "PRO", IdSuffix::Digits);
define_id!(CartLineId, "CART", IdSuffix::Digits);
define_id!(OrderId, "ORD", IdSuffix::Hex);
