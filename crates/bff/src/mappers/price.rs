//! Money and price mapping.

use shopfront_core::types::money::DEFAULT_FRACTION_DIGITS;
use shopfront_core::{Money, PriceModel};

use crate::commerce::types::{CommerceMoney, Price};

/// Convert vendor money.
#[must_use]
pub fn map_money(money: &CommerceMoney) -> Money {
    Money::new(
        money.cent_amount,
        money.currency_code.clone(),
        money.fraction_digits.unwrap_or(DEFAULT_FRACTION_DIGITS),
    )
}

/// Convert a standalone price with its optional discounted value.
#[must_use]
pub fn map_price(price: &Price) -> PriceModel {
    PriceModel::new(
        map_money(&price.value),
        price.discounted.as_ref().map(|d| map_money(&d.value)),
    )
}

/// Pick the price for a currency and country.
///
/// Prefers an exact currency + country match, then a price in the currency
/// without a country restriction, then any price in the currency.
#[must_use]
pub fn select_price<'a>(prices: &'a [Price], currency: &str, country: &str) -> Option<&'a Price> {
    let in_currency = || prices.iter().filter(|p| p.value.currency_code == currency);

    in_currency()
        .find(|p| p.country.as_deref() == Some(country))
        .or_else(|| in_currency().find(|p| p.country.is_none()))
        .or_else(|| in_currency().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::types::DiscountedPrice;

    fn price(cents: i64, currency: &str, country: Option<&str>) -> Price {
        Price {
            id: None,
            value: CommerceMoney::cents(cents, currency),
            country: country.map(str::to_string),
            discounted: None,
        }
    }

    #[test]
    fn test_map_money_defaults_fraction_digits() {
        let money = map_money(&CommerceMoney::cents(1999, "EUR"));
        assert_eq!(money.fraction_digits, 2);
        assert_eq!(money.display(), "€19.99");
    }

    #[test]
    fn test_map_price_with_discount() {
        let mut p = price(5000, "EUR", None);
        p.discounted = Some(DiscountedPrice {
            value: CommerceMoney::cents(4000, "EUR"),
            discount: None,
        });
        let model = map_price(&p);
        assert!(model.is_discounted());
        assert_eq!(model.formatted_discounted.as_deref(), Some("€40.00"));
    }

    #[test]
    fn test_select_price_prefers_country() {
        let prices = vec![
            price(1000, "USD", Some("US")),
            price(1100, "EUR", None),
            price(1200, "EUR", Some("DE")),
        ];
        assert_eq!(select_price(&prices, "EUR", "DE").map(|p| p.value.cent_amount), Some(1200));
        assert_eq!(select_price(&prices, "EUR", "FR").map(|p| p.value.cent_amount), Some(1100));
        assert!(select_price(&prices, "GBP", "GB").is_none());
    }

    #[test]
    fn test_select_price_any_in_currency() {
        let prices = vec![price(900, "EUR", Some("AT"))];
        assert_eq!(select_price(&prices, "EUR", "DE").map(|p| p.value.cent_amount), Some(900));
    }
}
