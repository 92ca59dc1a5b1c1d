//! Integer-cent price representation.
//!
//! Every amount in the system is stored and computed as whole cents. Decimal
//! values only appear at the edges (seed files, display) and are converted
//! with [`Price::from_decimal`] / [`Price::to_decimal`].

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Error converting a decimal amount into cents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price has more than two decimal places: {0}")]
    SubCent(Decimal),
    #[error("price is out of range: {0}")]
    OutOfRange(Decimal),
}

/// A non-negative amount in the smallest currency unit (cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create a price from cents. Negative input is clamped to zero.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        if cents < 0 { Self(0) } else { Self(cents) }
    }

    /// Convert a decimal amount in currency units (e.g. `49.99`) into cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, has sub-cent precision, or
    /// does not fit in an `i64` number of cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let cents = amount * Decimal::ONE_HUNDRED;
        if cents.fract() != Decimal::ZERO {
            return Err(PriceError::SubCent(amount));
        }
        cents
            .to_i64()
            .map(Self)
            .ok_or(PriceError::OutOfRange(amount))
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount in currency units with two decimal places.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Line total for `quantity` units, saturating at `i64::MAX` cents.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Self(cents))
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.to_decimal())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

/// ISO 4217 currency codes accepted by the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Cad,
    Gbp,
    Eur,
}

impl CurrencyCode {
    /// Lowercase code as Stripe expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Cad => "cad",
            Self::Gbp => "gbp",
            Self::Eur => "eur",
        }
    }
}

impl core::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::Usd),
            "cad" => Ok(Self::Cad),
            "gbp" => Ok(Self::Gbp),
            "eur" => Ok(Self::Eur),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
