//! Price view model.

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// A unit price with an optional discounted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceModel {
    pub value: Money,
    pub discounted: Option<Money>,
    pub formatted: String,
    pub formatted_discounted: Option<String>,
}

impl PriceModel {
    /// Build a price model, pre-formatting both amounts.
    #[must_use]
    pub fn new(value: Money, discounted: Option<Money>) -> Self {
        let formatted = value.display();
        let formatted_discounted = discounted.as_ref().map(Money::display);
        Self {
            value,
            discounted,
            formatted,
            formatted_discounted,
        }
    }

    /// The amount the customer actually pays per unit.
    #[must_use]
    pub fn effective(&self) -> &Money {
        self.discounted.as_ref().unwrap_or(&self.value)
    }

    /// Whether a discounted value is present and lower than the list value.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discounted
            .as_ref()
            .is_some_and(|d| d.cent_amount < self.value.cent_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_prefers_discounted() {
        let price = PriceModel::new(Money::new(1000, "EUR", 2), Some(Money::new(800, "EUR", 2)));
        assert_eq!(price.effective().cent_amount, 800);
        assert!(price.is_discounted());
        assert_eq!(price.formatted_discounted.as_deref(), Some("€8.00"));
    }

    #[test]
    fn test_not_discounted_without_value() {
        let price = PriceModel::new(Money::new(1000, "EUR", 2), None);
        assert_eq!(price.effective().cent_amount, 1000);
        assert!(!price.is_discounted());
    }
}
