//! Asking price of a listing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ListingValidationError;

/// Non-negative, finite asking price in dollars.
///
/// # Examples
/// ```
/// use marketplace::domain::Price;
///
/// let price: Price = " 12.5 ".parse().expect("valid price");
/// assert_eq!(price.amount(), 12.5);
/// assert_eq!(price.to_string(), "$12.50");
/// assert!("-1".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    /// Validate a numeric amount.
    pub fn new(amount: f64) -> Result<Self, ListingValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ListingValidationError::InvalidPrice {
                input: amount.to_string(),
            });
        }
        // Normalise negative zero so it renders as `$0.00`.
        Ok(Self(amount + 0.0))
    }

    /// The amount in dollars.
    pub fn amount(self) -> f64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = ListingValidationError;

    /// Parse the user's text input. Surrounding whitespace is ignored; any
    /// other trailing characters make the input invalid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ListingValidationError::InvalidPrice { input: s.to_owned() };
        let amount: f64 = s.trim().parse().map_err(|_| invalid())?;
        Self::new(amount).map_err(|_| invalid())
    }
}

impl TryFrom<f64> for Price {
    type Error = ListingValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
