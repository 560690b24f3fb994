//! Monetary amounts in minor units with decimal display.
//!
//! The commerce platform and the payment gateway both exchange money as an
//! integer count of minor units plus a currency code. `Money` keeps that
//! representation and converts to [`Decimal`] only for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default number of fraction digits for currencies without an explicit value.
pub const DEFAULT_FRACTION_DIGITS: u32 = 2;

/// An amount of money in minor units (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units.
    pub cent_amount: i64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Number of minor-unit digits (2 for EUR/USD, 0 for JPY).
    pub fraction_digits: u32,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(cent_amount: i64, currency_code: impl Into<String>, fraction_digits: u32) -> Self {
        Self {
            cent_amount,
            currency_code: currency_code.into(),
            fraction_digits,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>, fraction_digits: u32) -> Self {
        Self::new(0, currency_code, fraction_digits)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.cent_amount == 0
    }

    /// The amount in major units.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.cent_amount, self.fraction_digits.min(28))
    }

    /// Add two amounts. Returns `None` on currency mismatch or overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        Some(Self {
            cent_amount: self.cent_amount.checked_add(other.cent_amount)?,
            currency_code: self.currency_code.clone(),
            fraction_digits: self.fraction_digits,
        })
    }

    /// Subtract an amount. Returns `None` on currency mismatch or overflow.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        Some(Self {
            cent_amount: self.cent_amount.checked_sub(other.cent_amount)?,
            currency_code: self.currency_code.clone(),
            fraction_digits: self.fraction_digits,
        })
    }

    /// Multiply by a quantity (saturating).
    #[must_use]
    pub fn multiply(&self, quantity: i64) -> Self {
        Self {
            cent_amount: self.cent_amount.saturating_mul(quantity),
            currency_code: self.currency_code.clone(),
            fraction_digits: self.fraction_digits,
        }
    }

    /// Format for display (e.g., "€19.99", "-$5.00", "CHF 12.50").
    #[must_use]
    pub fn display(&self) -> String {
        let amount = self.amount();
        let sign = if amount.is_sign_negative() && !amount.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = self.fraction_digits as usize;
        let value = format!("{:.digits$}", amount.abs());
        match currency_symbol(&self.currency_code) {
            Some(symbol) => format!("{sign}{symbol}{value}"),
            None => format!("{sign}{} {value}", self.currency_code),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Symbol for well-known currencies.
fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        _ => None,
    }
}
