//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are whole-rupee amounts in the bundled catalog, but the type keeps
//! full decimal precision so that paise never get lost to float rounding.
//! On the wire (durable cart, catalog JSON) a price is a plain JSON number:
//! whole amounts are written as integers (`{"price": 49999}`), anything with
//! paise as a float (`{"price": 199.5}`).

use core::fmt;
use core::iter::Sum;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// A price in Indian rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "rust_decimal::serde::float::deserialize"
    )]
    Decimal,
);

fn serialize_amount<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let whole = if amount.fract().is_zero() {
        amount.to_i64()
    } else {
        None
    };
    if let Some(whole) = whole {
        return serializer.serialize_i64(whole);
    }
    match amount.to_f64() {
        Some(value) => serializer.serialize_f64(value),
        None => Err(serde::ser::Error::custom(format!(
            "price {amount} is not representable as a JSON number"
        ))),
    }
}

impl Price {
    /// Currency symbol appended to displayed prices.
    pub const SYMBOL: &'static str = "₹";

    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole-rupee amount.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount has no fractional part.
    #[must_use]
    pub fn is_whole(&self) -> bool {
        self.0.fract().is_zero()
    }

    /// Format for display with the currency symbol (e.g., "49999 ₹").
    #[must_use]
    pub fn display_inr(&self) -> String {
        format!("{self} {}", Self::SYMBOL)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
