//! Catalog price type.
//!
//! Prices are entered by administrators as text and stored as text. A price
//! is a non-negative decimal with at most two fractional digits (`499`,
//! `499.9`, `499.99`). Arithmetic happens on [`Decimal`] so line totals are
//! exact.
//!
//! Every amount, unit price or total, must fit `NUMERIC(12, 2)`; see
//! [`MAX_AMOUNT`].

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest amount a price or total may take: `9999999999.99`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Add two amounts, failing past [`MAX_AMOUNT`].
#[must_use]
pub fn checked_amount_add(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b).filter(|sum| *sum <= MAX_AMOUNT)
}

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not digits with an optional 1-2 digit fraction.
    #[error("price must be a number with at most 2 decimal places")]
    InvalidFormat,
    /// The value exceeds [`MAX_AMOUNT`].
    #[error("price must not exceed 9999999999.99")]
    OutOfRange,
}

/// A validated unit price.
///
/// ## Examples
///
/// ```
/// use ellectra_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::parse("25.50").unwrap();
/// assert_eq!(price.line_total(2), Some(Decimal::new(5100, 2)));
///
/// assert!(Price::parse("25.505").is_err());
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("1e3").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price(Decimal);

impl Price {
    /// Parse a price from its textual form.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input matches `^\d+(\.\d{1,2})?$` and is
    /// at most [`MAX_AMOUNT`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) {
            return Err(PriceError::InvalidFormat);
        }
        if let Some(fraction) = fraction
            && (!digits(fraction) || fraction.len() > 2)
        {
            return Err(PriceError::InvalidFormat);
        }

        Decimal::from_str(s)
            .ok()
            .filter(|amount| *amount <= MAX_AMOUNT)
            .map(Self)
            .ok_or(PriceError::OutOfRange)
    }

    /// The unit amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Unit price multiplied by `quantity`, or `None` past [`MAX_AMOUNT`].
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Option<Decimal> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .filter(|total| *total <= MAX_AMOUNT)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Price {
    type Error = PriceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.trim())
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
    }
}
