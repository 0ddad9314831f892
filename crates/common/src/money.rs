//! Money as an integer amount in the currency's minor unit, paired with its
//! currency code. Never represented as a float anywhere in this codebase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The two operands carry different currency codes.
    #[error("currency mismatch: {lhs} vs {rhs}")]
    CurrencyMismatch { lhs: String, rhs: String },

    /// `multiply_by_int` was called with a negative factor.
    #[error("multiply_by_int factor must be non-negative, got {factor}")]
    NegativeFactor { factor: i64 },
}

/// An amount of money in a single currency's minor unit (e.g. cents for
/// `USD`, whole units for `JPY`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// The amount, in the currency's minor unit.
    pub units: i64,

    /// ISO 4217 currency code, e.g. `"USD"`.
    pub currency_code: String,
}

impl Money {
    /// Creates a new amount.
    pub fn new(units: i64, currency_code: impl Into<String>) -> Self {
        Self {
            units,
            currency_code: currency_code.into(),
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(0, currency_code)
    }

    /// Number of decimal places conventionally used to display this
    /// currency. `JPY`, `IDR`, and `KRW` have none; everything else has two.
    pub fn decimal_places(&self) -> u32 {
        decimal_places_for(&self.currency_code)
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.check_same_currency(other)?;
        Ok(Money::new(self.units + other.units, self.currency_code.clone()))
    }

    /// Multiplies the amount by an integer factor (e.g. a line-item
    /// quantity). Currency never changes under multiplication. `factor` must
    /// be non-negative; a negative factor has no meaning for a line-item
    /// quantity and is rejected rather than silently producing a negative
    /// amount.
    pub fn multiply_by_int(&self, factor: i64) -> Result<Money, MoneyError> {
        if factor < 0 {
            return Err(MoneyError::NegativeFactor { factor });
        }
        Ok(Money::new(self.units * factor, self.currency_code.clone()))
    }

    /// True if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.units > 0
    }

    /// True if the amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// True if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.units < 0
    }

    fn check_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                lhs: self.currency_code.clone(),
                rhs: other.currency_code.clone(),
            });
        }
        Ok(())
    }
}

/// Returns the number of minor-unit decimal places conventionally used by
/// `currency_code`. Grounded in the original converter's currency table:
/// zero-decimal currencies (`JPY`, `IDR`, `KRW`) format as whole units,
/// everything else as two decimal places.
pub fn decimal_places_for(currency_code: &str) -> u32 {
    match currency_code {
        "JPY" | "IDR" | "KRW" => 0,
        _ => 2,
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let places = self.decimal_places();
        if places == 0 {
            return write!(f, "{} {}", self.units, self.currency_code);
        }
        let divisor = 10i64.pow(places);
        let whole = self.units / divisor;
        let frac = (self.units % divisor).unsigned_abs();
        write!(
            f,
            "{}.{:0width$} {}",
            whole,
            frac,
            self.currency_code,
            width = places as usize
        )
    }
}
