use crate::core::money::Money;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Supports standard fiat currencies (USD, EUR, JPY, etc.) as well as
/// arbitrary identifiers for anything a group chooses to record in.
///
/// # Examples
///
/// ```
/// use splitledger::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("USD");
/// let eur = CurrencyCode::new("EUR");
/// assert_ne!(usd, eur);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from currency normalization.
#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("no captured rate to convert {currency} into {base}")]
    UnknownCurrency {
        currency: CurrencyCode,
        base: CurrencyCode,
    },
    #[error("captured rate must be positive, got {rate} for {currency}")]
    InvalidRate {
        currency: CurrencyCode,
        rate: Decimal,
    },
    #[error("{amount} {currency} at rate {rate} does not fit in minor units")]
    Overflow {
        currency: CurrencyCode,
        amount: Money,
        rate: Decimal,
    },
}

/// Converts recorded amounts into a group's base currency.
///
/// Every record stores the exchange rate captured when it was created;
/// normalization only ever uses that captured rate. Rates are never
/// re-fetched during aggregation, so replaying the same history always
/// reproduces the same figures even if live market rates have moved since.
///
/// Rounding is half-away-from-zero to whole minor units.
///
/// # Examples
///
/// ```
/// use splitledger::core::currency::{CurrencyCode, CurrencyNormalizer};
/// use splitledger::core::money::Money;
/// use rust_decimal_macros::dec;
///
/// let normalizer = CurrencyNormalizer::new(CurrencyCode::new("USD"));
/// let converted = normalizer
///     .normalize(Money::from_minor(1000), &CurrencyCode::new("EUR"), Some(dec!(1.10)))
///     .unwrap();
/// assert_eq!(converted, Money::from_minor(1100));
/// ```
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    base: CurrencyCode,
}

impl CurrencyNormalizer {
    pub fn new(base: CurrencyCode) -> Self {
        Self { base }
    }

    /// The base currency all amounts normalize into.
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Convert an amount recorded in `currency` into base minor units using
    /// the rate captured at record-creation time.
    ///
    /// An amount already in the base currency passes through unchanged.
    pub fn normalize(
        &self,
        amount: Money,
        currency: &CurrencyCode,
        rate: Option<Decimal>,
    ) -> Result<Money, CurrencyError> {
        if *currency == self.base {
            return Ok(amount);
        }
        let rate = rate.ok_or_else(|| CurrencyError::UnknownCurrency {
            currency: currency.clone(),
            base: self.base.clone(),
        })?;
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::InvalidRate {
                currency: currency.clone(),
                rate,
            });
        }
        let converted = Decimal::from(amount.minor()) * rate;
        converted
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money::from_minor)
            .ok_or(CurrencyError::Overflow {
                currency: currency.clone(),
                amount,
                rate,
            })
    }
}
