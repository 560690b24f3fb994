//! Discount code and discount total mapping.

use shopfront_core::{DiscountModel, Money};

use super::price::map_money;
use crate::commerce::types::{DiscountCodeInfo, DiscountOnTotalPrice, LineItem};

/// Vendor state of a code that currently reduces the cart.
const MATCHES_CART: &str = "MatchesCart";

/// Map the discount codes attached to a cart or order.
///
/// The code comes from the expanded discount code, falling back to the
/// reference ID when the read was not expanded.
#[must_use]
pub fn map_discounts(codes: &[DiscountCodeInfo]) -> Vec<DiscountModel> {
    codes
        .iter()
        .map(|info| {
            let reference = &info.discount_code;
            let state = info.state.clone().unwrap_or_default();
            DiscountModel {
                id: reference.id.clone(),
                code: reference
                    .obj
                    .as_ref()
                    .map_or_else(|| reference.id.clone(), |obj| obj.code.clone()),
                applied: state == MATCHES_CART,
                state,
            }
        })
        .collect()
}

/// Total discount: undiscounted subtotal minus the sum of line totals, plus
/// any cart-level discount.
///
/// Never negative; lines in another currency are ignored.
#[must_use]
pub fn discount_total(
    subtotal: &Money,
    line_items: &[LineItem],
    on_total: Option<&DiscountOnTotalPrice>,
) -> Money {
    let lines_total = line_items
        .iter()
        .map(|line| map_money(&line.total_price))
        .filter(|total| total.currency_code == subtotal.currency_code)
        .map(|total| total.cent_amount)
        .sum::<i64>();

    let cart_level = on_total
        .map(|d| map_money(&d.discounted_amount))
        .filter(|d| d.currency_code == subtotal.currency_code)
        .map_or(0, |d| d.cent_amount);

    let cents = subtotal
        .cent_amount
        .saturating_sub(lines_total)
        .saturating_add(cart_level)
        .max(0);

    Money::new(cents, subtotal.currency_code.clone(), subtotal.fraction_digits)
}
