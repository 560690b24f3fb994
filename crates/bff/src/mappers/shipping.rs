//! Shipping method mapping.

use shopfront_core::{Money, ShippingMethodModel};

use super::locale::localize;
use super::price::map_money;
use crate::commerce::types::ShippingMethod;

/// Map a shipping method returned by a cart-matching query.
///
/// The price is the rate flagged as matching the cart, falling back to the
/// first rate in the cart's currency.
#[must_use]
pub fn map_shipping_method(method: &ShippingMethod, currency: &str, locale: &str) -> ShippingMethodModel {
    let rates = || method.zone_rates.iter().flat_map(|z| z.shipping_rates.iter());

    let price = rates()
        .find(|r| r.is_matching == Some(true))
        .or_else(|| rates().find(|r| r.price.currency_code == currency))
        .map(|r| map_money(&r.price));

    ShippingMethodModel {
        id: method.id.clone(),
        name: method.name.clone(),
        description: method
            .localized_description
            .as_ref()
            .and_then(|d| localize(d, locale))
            .map(str::to_string),
        formatted_price: price.as_ref().map(Money::display),
        price,
        is_default: method.is_default,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn method(rates: &serde_json::Value) -> ShippingMethod {
        serde_json::from_value(serde_json::json!({
            "id": "sm-1",
            "name": "Standard",
            "localizedDescription": {"en": "3-5 working days"},
            "isDefault": true,
            "zoneRates": [{"zone": {"typeId": "zone", "id": "z-1"}, "shippingRates": rates}]
        }))
        .unwrap()
    }

    #[test]
    fn test_matching_rate_wins() {
        let model = map_shipping_method(
            &method(&serde_json::json!([
                {"price": {"currencyCode": "EUR", "centAmount": 495}},
                {"price": {"currencyCode": "EUR", "centAmount": 0}, "isMatching": true}
            ])),
            "EUR",
            "en-GB",
        );
        assert_eq!(model.price.unwrap().cent_amount, 0);
        assert_eq!(model.description.as_deref(), Some("3-5 working days"));
        assert!(model.is_default);
    }

    #[test]
    fn test_falls_back_to_currency_rate() {
        let model = map_shipping_method(
            &method(&serde_json::json!([
                {"price": {"currencyCode": "USD", "centAmount": 700}},
                {"price": {"currencyCode": "EUR", "centAmount": 495}}
            ])),
            "EUR",
            "en-GB",
        );
        assert_eq!(model.formatted_price.as_deref(), Some("€4.95"));
    }

    #[test]
    fn test_no_rate_in_currency() {
        let model = map_shipping_method(&method(&serde_json::json!([])), "EUR", "en-GB");
        assert!(model.price.is_none());
        assert!(model.formatted_price.is_none());
    }
}
