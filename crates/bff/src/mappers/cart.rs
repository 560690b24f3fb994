//! Cart mapping.
//!
//! Line items and totals are shared with [`super::order`].

use shopfront_core::{CartModel, LineItemModel, Money, ShippingInfoModel};

use super::address::map_address;
use super::discount::{discount_total, map_discounts};
use super::locale::localize_or_default;
use super::price::{map_money, map_price};
use crate::commerce::types::{
    Cart, CommerceMoney, DiscountOnTotalPrice, LineItem, ShippingInfo, TaxedPrice,
};

/// Map a cart to its view model.
#[must_use]
pub fn map_cart(cart: &Cart, locale: &str) -> CartModel {
    let totals = Totals::compute(
        &cart.line_items,
        &cart.total_price,
        cart.taxed_price.as_ref(),
        cart.shipping_info.as_ref(),
        cart.discount_on_total_price.as_ref(),
    );

    CartModel {
        id: cart.id.clone(),
        version: cart.version,
        currency: cart.total_price.currency_code.clone(),
        customer_email: cart.customer_email.clone(),
        state: cart.cart_state.clone().unwrap_or_else(|| "Active".to_string()),
        line_items: cart
            .line_items
            .iter()
            .map(|line| map_line_item(line, locale))
            .collect(),
        item_count: totals.item_count,
        formatted_subtotal: totals.subtotal.display(),
        formatted_discount_total: totals.discount_total.display(),
        formatted_shipping: totals.shipping.as_ref().map(Money::display),
        formatted_tax: totals.tax.as_ref().map(Money::display),
        formatted_total: totals.total.display(),
        subtotal: totals.subtotal,
        discount_total: totals.discount_total,
        shipping: totals.shipping,
        tax: totals.tax,
        total: totals.total,
        discounts: map_discounts(&cart.discount_codes),
        shipping_address: cart.shipping_address.as_ref().map(map_address),
        billing_address: cart.billing_address.as_ref().map(map_address),
        shipping_info: cart.shipping_info.as_ref().map(map_shipping_info),
        payment_ids: cart
            .payment_info
            .as_ref()
            .map(|info| info.payments.iter().map(|p| p.id.clone()).collect())
            .unwrap_or_default(),
    }
}

/// Map one cart or order line.
#[must_use]
pub fn map_line_item(line: &LineItem, locale: &str) -> LineItemModel {
    let unit_price = map_price(&line.price);
    let total = map_money(&line.total_price);
    LineItemModel {
        id: line.id.clone(),
        product_id: line.product_id.clone(),
        product_key: line.product_key.clone(),
        name: localize_or_default(&line.name, locale),
        sku: line.variant.sku.clone(),
        variant_id: line.variant.id,
        image_url: line.variant.images.first().map(|i| i.url.clone()),
        quantity: line.quantity,
        unit_price,
        formatted_total: total.display(),
        total,
    }
}

/// Selected shipping method; the discounted price wins when present.
#[must_use]
pub fn map_shipping_info(info: &ShippingInfo) -> ShippingInfoModel {
    let price = map_money(
        info.discounted_price
            .as_ref()
            .map_or(&info.price, |d| &d.value),
    );
    ShippingInfoModel {
        shipping_method_id: info.shipping_method.as_ref().map(|r| r.id.clone()),
        name: info.shipping_method_name.clone(),
        formatted_price: price.display(),
        price,
    }
}

/// Derived totals of a cart or order.
pub(super) struct Totals {
    pub item_count: i64,
    pub subtotal: Money,
    pub discount_total: Money,
    pub shipping: Option<Money>,
    pub tax: Option<Money>,
    pub total: Money,
}

impl Totals {
    pub(super) fn compute(
        line_items: &[LineItem],
        total_price: &CommerceMoney,
        taxed_price: Option<&TaxedPrice>,
        shipping_info: Option<&ShippingInfo>,
        discount_on_total: Option<&DiscountOnTotalPrice>,
    ) -> Self {
        let total = map_money(total_price);
        let zero = Money::zero(total.currency_code.clone(), total.fraction_digits);

        // Undiscounted: list unit price times quantity
        let subtotal = line_items
            .iter()
            .map(|line| map_money(&line.price.value).multiply(line.quantity))
            .fold(zero, |acc, line_total| {
                acc.checked_add(&line_total).unwrap_or(acc)
            });

        let tax = taxed_price.and_then(|taxed| {
            map_money(&taxed.total_gross).checked_sub(&map_money(&taxed.total_net))
        });

        Self {
            item_count: line_items.iter().map(|line| line.quantity).sum(),
            discount_total: discount_total(&subtotal, line_items, discount_on_total),
            shipping: shipping_info.map(|info| map_shipping_info(info).price),
            subtotal,
            tax,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_json() -> serde_json::Value {
        serde_json::json!({
            "id": "cart-1",
            "version": 5,
            "cartState": "Active",
            "customerEmail": "ada@example.test",
            "lineItems": [
                {
                    "id": "line-1",
                    "productId": "prod-1",
                    "productKey": "trainer",
                    "name": {"en-GB": "Trainer", "de-DE": "Turnschuh"},
                    "variant": {"id": 1, "sku": "TR-42", "images": [{"url": "https://img.test/tr.jpg"}]},
                    "price": {"value": {"currencyCode": "EUR", "centAmount": 5000, "fractionDigits": 2}},
                    "quantity": 2,
                    "totalPrice": {"currencyCode": "EUR", "centAmount": 9000, "fractionDigits": 2}
                },
                {
                    "id": "line-2",
                    "productId": "prod-2",
                    "name": {"en-GB": "Socks"},
                    "variant": {"id": 1, "sku": "SO-1"},
                    "price": {"value": {"currencyCode": "EUR", "centAmount": 500, "fractionDigits": 2}},
                    "quantity": 1,
                    "totalPrice": {"currencyCode": "EUR", "centAmount": 500, "fractionDigits": 2}
                }
            ],
            "totalPrice": {"currencyCode": "EUR", "centAmount": 9000, "fractionDigits": 2},
            "taxedPrice": {
                "totalNet": {"currencyCode": "EUR", "centAmount": 7563, "fractionDigits": 2},
                "totalGross": {"currencyCode": "EUR", "centAmount": 9000, "fractionDigits": 2}
            },
            "shippingInfo": {
                "shippingMethodName": "Standard",
                "price": {"currencyCode": "EUR", "centAmount": 495, "fractionDigits": 2},
                "discountedPrice": {"value": {"currencyCode": "EUR", "centAmount": 0, "fractionDigits": 2}},
                "shippingMethod": {"typeId": "shipping-method", "id": "sm-1"}
            },
            "discountCodes": [
                {"discountCode": {"typeId": "discount-code", "id": "dc-1", "obj": {"id": "dc-1", "code": "SAVE10"}}, "state": "MatchesCart"}
            ],
            "discountOnTotalPrice": {
                "discountedAmount": {"currencyCode": "EUR", "centAmount": 500, "fractionDigits": 2}
            },
            "paymentInfo": {"payments": [{"typeId": "payment", "id": "pay-1"}]}
        })
    }

    #[test]
    fn test_map_cart_totals() {
        let cart: Cart = serde_json::from_value(cart_json()).unwrap();
        let model = map_cart(&cart, "en-GB");

        assert_eq!(model.item_count, 3);
        // 2 x 50.00 + 5.00
        assert_eq!(model.subtotal.cent_amount, 10500);
        // 105.00 - 95.00 + 5.00 cart-level
        assert_eq!(model.discount_total.cent_amount, 1500);
        assert_eq!(model.tax.as_ref().unwrap().cent_amount, 1437);
        assert_eq!(model.shipping.as_ref().unwrap().cent_amount, 0);
        assert_eq!(model.total.cent_amount, 9000);
        assert_eq!(model.formatted_total, "€90.00");
        assert!(model.has_discount());
    }

    #[test]
    fn test_map_cart_references() {
        let cart: Cart = serde_json::from_value(cart_json()).unwrap();
        let model = map_cart(&cart, "de-DE");

        assert_eq!(model.version, 5);
        assert_eq!(model.line_items[0].name, "Turnschuh");
        assert_eq!(model.line_items[0].image_url.as_deref(), Some("https://img.test/tr.jpg"));
        assert_eq!(model.discounts[0].code, "SAVE10");
        assert_eq!(model.payment_ids, vec!["pay-1".to_string()]);
        assert_eq!(
            model.shipping_info.unwrap().shipping_method_id.as_deref(),
            Some("sm-1")
        );
    }

    #[test]
    fn test_map_empty_cart() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "id": "cart-2",
            "version": 1,
            "totalPrice": {"currencyCode": "GBP", "centAmount": 0, "fractionDigits": 2}
        }))
        .unwrap();
        let model = map_cart(&cart, "en-GB");

        assert!(model.is_empty());
        assert_eq!(model.state, "Active");
        assert_eq!(model.formatted_subtotal, "£0.00");
        assert!(model.tax.is_none());
        assert!(model.shipping.is_none());
        assert!(!model.has_discount());
    }
}
