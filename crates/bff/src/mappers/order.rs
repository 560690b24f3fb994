//! Order mapping.

use shopfront_core::{Money, OrderModel};

use super::address::map_address;
use super::cart::{Totals, map_line_item, map_shipping_info};
use super::discount::map_discounts;
use crate::commerce::types::Order;

/// Map an order to its view model.
#[must_use]
pub fn map_order(order: &Order, locale: &str) -> OrderModel {
    let totals = Totals::compute(
        &order.line_items,
        &order.total_price,
        order.taxed_price.as_ref(),
        order.shipping_info.as_ref(),
        order.discount_on_total_price.as_ref(),
    );

    OrderModel {
        id: order.id.clone(),
        order_number: order.order_number.clone(),
        created_at: order.created_at,
        order_state: order.order_state.clone(),
        payment_state: order.payment_state.clone(),
        shipment_state: order.shipment_state.clone(),
        customer_email: order.customer_email.clone(),
        line_items: order
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
        discounts: map_discounts(&order.discount_codes),
        shipping_address: order.shipping_address.as_ref().map(map_address),
        billing_address: order.billing_address.as_ref().map(map_address),
        shipping_info: order.shipping_info.as_ref().map(map_shipping_info),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_order() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": "order-1",
            "version": 1,
            "orderNumber": "SF-1001",
            "createdAt": "2026-03-14T09:30:00.000Z",
            "orderState": "Open",
            "paymentState": "Paid",
            "lineItems": [{
                "id": "line-1",
                "productId": "prod-1",
                "name": {"en": "Scarf"},
                "variant": {"id": 2, "sku": "SC-2"},
                "price": {"value": {"currencyCode": "USD", "centAmount": 2500, "fractionDigits": 2}},
                "quantity": 1,
                "totalPrice": {"currencyCode": "USD", "centAmount": 2500, "fractionDigits": 2}
            }],
            "totalPrice": {"currencyCode": "USD", "centAmount": 2995, "fractionDigits": 2},
            "shippingInfo": {
                "shippingMethodName": "Express",
                "price": {"currencyCode": "USD", "centAmount": 495, "fractionDigits": 2}
            },
            "shippingAddress": {"firstName": "Ada", "country": "US"}
        }))
        .unwrap();

        let model = map_order(&order, "en-US");
        assert_eq!(model.reference(), "SF-1001");
        assert_eq!(model.placed_on(), "March 14, 2026");
        assert_eq!(model.line_items[0].name, "Scarf");
        assert_eq!(model.formatted_shipping.as_deref(), Some("$4.95"));
        assert_eq!(model.discount_total.cent_amount, 0);
        assert_eq!(model.shipping_address.unwrap().country, "US");
    }
}
