//! Cart update orchestration.
//!
//! Clients send a list of [`CartAction`]s. Before writing we:
//!
//! 1. fetch the cart to get its current version (the client's version is
//!    only advisory, the platform's optimistic-concurrency check runs against
//!    the fresh one);
//! 2. drop actions that would not change anything;
//! 3. append the follow-up actions the platform does not do on its own
//!    (re-pricing shipping after line changes, unsetting a method that may no
//!    longer ship to a new country, recalculating discounts).
//!
//! An empty plan returns the fetched cart without writing. Otherwise the plan
//! goes out as a single update. A version conflict is surfaced to the caller;
//! there is no retry.

use std::collections::{HashMap, HashSet};

use shopfront_core::CartAction;
use tracing::{debug, instrument, warn};

use crate::commerce::types::{Cart, Reference};
use crate::commerce::{CartUpdateAction, CommerceClient};
use crate::error::{AppError, Result, require};
use crate::mappers::to_commerce_address;

/// Applies client cart actions against the commerce platform.
pub struct CartUpdater<'a> {
    commerce: &'a CommerceClient,
}

impl<'a> CartUpdater<'a> {
    #[must_use]
    pub const fn new(commerce: &'a CommerceClient) -> Self {
        Self { commerce }
    }

    /// Refresh, plan and apply `actions` to a cart.
    ///
    /// # Errors
    ///
    /// Returns `RequiredField`/`BadRequest` for invalid actions, `NotFound`
    /// for an unknown cart, and the commerce error (including a version
    /// conflict) if the update is rejected.
    #[instrument(skip(self, actions), fields(cart_id = %cart_id, requested = actions.len()))]
    pub async fn apply(
        &self,
        cart_id: &str,
        client_version: Option<i64>,
        actions: &[CartAction],
    ) -> Result<Cart> {
        validate(actions)?;

        let cart = self.commerce.get_cart(cart_id).await?;
        if let Some(version) = client_version
            && version != cart.version
        {
            debug!(
                client_version = version,
                current_version = cart.version,
                "Client cart version is stale, using current version"
            );
        }

        let plan = plan_update(&cart, actions);
        if plan.is_empty() {
            debug!("Nothing to update");
            return Ok(cart);
        }

        debug!(planned = plan.len(), version = cart.version, "Updating cart");
        Ok(self
            .commerce
            .update_cart(&cart.id, cart.version, &plan)
            .await?)
    }
}

/// Reject actions with blank identifiers or negative quantities.
fn validate(actions: &[CartAction]) -> Result<()> {
    if actions.is_empty() {
        return Err(AppError::RequiredField("actions".to_string()));
    }

    for action in actions {
        match action {
            CartAction::AddLineItem { sku, quantity } => {
                require(sku, "sku")?;
                non_negative(*quantity)?;
            }
            CartAction::ChangeLineItemQuantity {
                line_item_id,
                quantity,
            } => {
                require(line_item_id, "line_item_id")?;
                non_negative(*quantity)?;
            }
            CartAction::RemoveLineItem { line_item_id } => {
                require(line_item_id, "line_item_id")?;
            }
            CartAction::AddDiscountCode { code } => {
                require(code, "code")?;
            }
            CartAction::RemoveDiscountCode { discount_code_id } => {
                require(discount_code_id, "discount_code_id")?;
            }
            CartAction::SetShippingAddress { address } | CartAction::SetBillingAddress { address } => {
                require(&address.country, "country")?;
            }
            CartAction::SetShippingMethod { shipping_method_id } => {
                require(shipping_method_id, "shipping_method_id")?;
            }
            CartAction::SetCustomerEmail { email } => {
                if !require(email, "email")?.contains('@') {
                    return Err(AppError::BadRequest(format!("Invalid email address: {email}")));
                }
            }
            CartAction::AddPayment { payment_id } => {
                require(payment_id, "payment_id")?;
            }
        }
    }
    Ok(())
}

fn non_negative(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(AppError::BadRequest(format!(
            "Quantity must not be negative, got {quantity}"
        )));
    }
    Ok(())
}

/// Translate client actions into vendor update actions for `cart`.
///
/// Actions are evaluated in order against the cart as it would look after
/// the earlier actions of the batch, and dropped when they would change
/// nothing. Follow-up actions are appended after the requested ones.
#[must_use]
pub fn plan_update(cart: &Cart, requested: &[CartAction]) -> Vec<CartUpdateAction> {
    let mut state = PlanState::new(cart);
    let mut plan = Vec::with_capacity(requested.len() + 2);

    for action in requested {
        if let Some(update) = state.translate(action) {
            plan.push(update);
        }
    }

    let lines_changed = plan.iter().any(CartUpdateAction::touches_line_items);
    let codes_changed = plan.iter().any(CartUpdateAction::touches_discount_codes);
    let method_set = plan
        .iter()
        .any(|a| matches!(a, CartUpdateAction::SetShippingMethod { .. }));

    if let Some(method_id) = cart.shipping_method_id()
        && !method_set
    {
        if state.country_changed {
            // The current method may not ship to the new country
            plan.push(CartUpdateAction::SetShippingMethod {
                shipping_method: None,
            });
        } else if lines_changed {
            // Shipping rates may depend on the cart value
            plan.push(CartUpdateAction::SetShippingMethod {
                shipping_method: Some(Reference::new("shipping-method", method_id)),
            });
        }
    }

    if (lines_changed || codes_changed) && !cart.discount_codes.is_empty() {
        plan.push(CartUpdateAction::Recalculate {
            update_product_data: false,
        });
    }

    plan
}

/// Cart state tracked while planning a batch.
struct PlanState<'a> {
    cart: &'a Cart,
    quantities: HashMap<&'a str, i64>,
    /// Lower-cased codes on the cart or added in this batch.
    codes: HashSet<String>,
    code_ids: HashSet<&'a str>,
    shipping_method: Option<String>,
    email: Option<String>,
    country_changed: bool,
}

impl<'a> PlanState<'a> {
    fn new(cart: &'a Cart) -> Self {
        Self {
            cart,
            quantities: cart
                .line_items
                .iter()
                .map(|line| (line.id.as_str(), line.quantity))
                .collect(),
            codes: cart
                .discount_codes
                .iter()
                .filter_map(|info| info.discount_code.obj.as_ref())
                .map(|code| code.code.to_lowercase())
                .collect(),
            code_ids: cart
                .discount_codes
                .iter()
                .map(|info| info.discount_code.id.as_str())
                .collect(),
            shipping_method: cart.shipping_method_id().map(str::to_string),
            email: cart.customer_email.as_ref().map(|e| e.to_lowercase()),
            country_changed: false,
        }
    }

    #[allow(clippy::too_many_lines)]
    fn translate(&mut self, action: &CartAction) -> Option<CartUpdateAction> {
        match action {
            CartAction::AddLineItem { sku, quantity } => {
                if *quantity == 0 {
                    debug!(sku = %sku, "Skipping add with zero quantity");
                    return None;
                }
                Some(CartUpdateAction::AddLineItem {
                    sku: sku.trim().to_string(),
                    quantity: *quantity,
                })
            }
            CartAction::ChangeLineItemQuantity {
                line_item_id,
                quantity,
            } => {
                let Some(current) = self.quantities.get(line_item_id.as_str()).copied() else {
                    warn!(line_item_id = %line_item_id, "Skipping quantity change for unknown line");
                    return None;
                };
                if current == *quantity {
                    debug!(line_item_id = %line_item_id, "Skipping unchanged quantity");
                    return None;
                }
                if *quantity == 0 {
                    self.quantities.remove(line_item_id.as_str());
                    return Some(CartUpdateAction::RemoveLineItem {
                        line_item_id: line_item_id.clone(),
                    });
                }
                let key = self.line_key(line_item_id)?;
                self.quantities.insert(key, *quantity);
                Some(CartUpdateAction::ChangeLineItemQuantity {
                    line_item_id: line_item_id.clone(),
                    quantity: *quantity,
                })
            }
            CartAction::RemoveLineItem { line_item_id } => {
                if self.quantities.remove(line_item_id.as_str()).is_none() {
                    debug!(line_item_id = %line_item_id, "Skipping removal of unknown line");
                    return None;
                }
                Some(CartUpdateAction::RemoveLineItem {
                    line_item_id: line_item_id.clone(),
                })
            }
            CartAction::AddDiscountCode { code } => {
                let code = code.trim();
                if !self.codes.insert(code.to_lowercase()) {
                    debug!(code = %code, "Skipping discount code already on cart");
                    return None;
                }
                Some(CartUpdateAction::AddDiscountCode {
                    code: code.to_string(),
                })
            }
            CartAction::RemoveDiscountCode { discount_code_id } => {
                if !self.code_ids.remove(discount_code_id.as_str()) {
                    debug!(discount_code_id = %discount_code_id, "Skipping removal of code not on cart");
                    return None;
                }
                Some(CartUpdateAction::RemoveDiscountCode {
                    discount_code: Reference::new("discount-code", discount_code_id.clone()),
                })
            }
            CartAction::SetShippingAddress { address } => {
                let address = to_commerce_address(address);
                if self.cart.shipping_address.as_ref() == Some(&address) {
                    return None;
                }
                let previous_country = self
                    .cart
                    .shipping_address
                    .as_ref()
                    .map(|a| a.country.as_str())
                    .or(self.cart.country.as_deref());
                if previous_country.is_some_and(|c| !c.eq_ignore_ascii_case(&address.country)) {
                    self.country_changed = true;
                }
                Some(CartUpdateAction::SetShippingAddress {
                    address: Some(address),
                })
            }
            CartAction::SetBillingAddress { address } => {
                let address = to_commerce_address(address);
                if self.cart.billing_address.as_ref() == Some(&address) {
                    return None;
                }
                Some(CartUpdateAction::SetBillingAddress {
                    address: Some(address),
                })
            }
            CartAction::SetShippingMethod { shipping_method_id } => {
                if self.shipping_method.as_deref() == Some(shipping_method_id.as_str()) {
                    debug!("Skipping unchanged shipping method");
                    return None;
                }
                self.shipping_method = Some(shipping_method_id.clone());
                Some(CartUpdateAction::SetShippingMethod {
                    shipping_method: Some(Reference::new(
                        "shipping-method",
                        shipping_method_id.clone(),
                    )),
                })
            }
            CartAction::SetCustomerEmail { email } => {
                let email = email.trim();
                if self.email.as_deref() == Some(email.to_lowercase().as_str()) {
                    return None;
                }
                self.email = Some(email.to_lowercase());
                Some(CartUpdateAction::SetCustomerEmail {
                    email: Some(email.to_string()),
                })
            }
            CartAction::AddPayment { payment_id } => {
                let attached = self
                    .cart
                    .payment_info
                    .as_ref()
                    .is_some_and(|info| info.payments.iter().any(|p| &p.id == payment_id));
                if attached {
                    return None;
                }
                Some(CartUpdateAction::AddPayment {
                    payment: Reference::new("payment", payment_id.clone()),
                })
            }
        }
    }

    /// Borrow the line ID from the cart so the map can keep `&'a str` keys.
    fn line_key(&self, line_item_id: &str) -> Option<&'a str> {
        self.cart.line_item(line_item_id).map(|line| line.id.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopfront_core::AddressModel;

    fn cart(extra: &serde_json::Value) -> Cart {
        let mut base = serde_json::json!({
            "id": "cart-1",
            "version": 7,
            "country": "DE",
            "customerEmail": "Ada@Example.test",
            "lineItems": [{
                "id": "line-1",
                "productId": "prod-1",
                "name": {"en": "Trainer"},
                "variant": {"id": 1, "sku": "TR-42"},
                "price": {"value": {"currencyCode": "EUR", "centAmount": 5000}},
                "quantity": 2,
                "totalPrice": {"currencyCode": "EUR", "centAmount": 10000}
            }],
            "totalPrice": {"currencyCode": "EUR", "centAmount": 10000},
            "shippingAddress": {"firstName": "Ada", "city": "Berlin", "country": "DE"}
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn with_method_and_code() -> Cart {
        cart(&serde_json::json!({
            "shippingInfo": {
                "shippingMethodName": "Standard",
                "price": {"currencyCode": "EUR", "centAmount": 495},
                "shippingMethod": {"typeId": "shipping-method", "id": "sm-1"}
            },
            "discountCodes": [{
                "discountCode": {"typeId": "discount-code", "id": "dc-1", "obj": {"id": "dc-1", "code": "SAVE10"}},
                "state": "MatchesCart"
            }]
        }))
    }

    fn address(city: &str, country: &str) -> AddressModel {
        AddressModel {
            first_name: Some("Ada".to_string()),
            city: Some(city.to_string()),
            country: country.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_redundant_actions_are_skipped() {
        let plan = plan_update(
            &cart(&serde_json::json!({})),
            &[
                CartAction::AddLineItem {
                    sku: "SO-1".to_string(),
                    quantity: 0,
                },
                CartAction::ChangeLineItemQuantity {
                    line_item_id: "line-1".to_string(),
                    quantity: 2,
                },
                CartAction::ChangeLineItemQuantity {
                    line_item_id: "missing".to_string(),
                    quantity: 1,
                },
                CartAction::RemoveLineItem {
                    line_item_id: "missing".to_string(),
                },
                CartAction::RemoveDiscountCode {
                    discount_code_id: "dc-9".to_string(),
                },
                CartAction::SetShippingAddress {
                    address: address("Berlin", "DE"),
                },
                CartAction::SetCustomerEmail {
                    email: "ada@example.TEST".to_string(),
                },
            ],
        );
        assert!(plan.is_empty(), "unexpected plan: {plan:?}");
    }

    #[test]
    fn test_zero_quantity_becomes_removal() {
        let plan = plan_update(
            &cart(&serde_json::json!({})),
            &[CartAction::ChangeLineItemQuantity {
                line_item_id: "line-1".to_string(),
                quantity: 0,
            }],
        );
        assert_eq!(
            plan,
            vec![CartUpdateAction::RemoveLineItem {
                line_item_id: "line-1".to_string()
            }]
        );
    }

    #[test]
    fn test_actions_see_earlier_actions_in_batch() {
        let plan = plan_update(
            &cart(&serde_json::json!({})),
            &[
                CartAction::ChangeLineItemQuantity {
                    line_item_id: "line-1".to_string(),
                    quantity: 3,
                },
                CartAction::ChangeLineItemQuantity {
                    line_item_id: "line-1".to_string(),
                    quantity: 3,
                },
                CartAction::AddDiscountCode {
                    code: "WELCOME".to_string(),
                },
                CartAction::AddDiscountCode {
                    code: "welcome".to_string(),
                },
                CartAction::RemoveLineItem {
                    line_item_id: "line-1".to_string(),
                },
                CartAction::RemoveLineItem {
                    line_item_id: "line-1".to_string(),
                },
            ],
        );
        assert_eq!(plan.len(), 3, "unexpected plan: {plan:?}");
    }

    #[test]
    fn test_line_change_reprices_shipping_and_recalculates() {
        let plan = plan_update(
            &with_method_and_code(),
            &[CartAction::AddLineItem {
                sku: "SO-1".to_string(),
                quantity: 1,
            }],
        );
        assert_eq!(
            plan,
            vec![
                CartUpdateAction::AddLineItem {
                    sku: "SO-1".to_string(),
                    quantity: 1
                },
                CartUpdateAction::SetShippingMethod {
                    shipping_method: Some(Reference::new("shipping-method", "sm-1"))
                },
                CartUpdateAction::Recalculate {
                    update_product_data: false
                },
            ]
        );
    }

    #[test]
    fn test_existing_code_is_case_insensitive() {
        let plan = plan_update(
            &with_method_and_code(),
            &[CartAction::AddDiscountCode {
                code: "save10".to_string(),
            }],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_removing_code_recalculates_without_touching_shipping() {
        let plan = plan_update(
            &with_method_and_code(),
            &[CartAction::RemoveDiscountCode {
                discount_code_id: "dc-1".to_string(),
            }],
        );
        assert_eq!(plan.len(), 2);
        assert!(matches!(plan[0], CartUpdateAction::RemoveDiscountCode { .. }));
        assert!(matches!(plan[1], CartUpdateAction::Recalculate { .. }));
    }

    #[test]
    fn test_country_change_unsets_shipping_method() {
        let plan = plan_update(
            &with_method_and_code(),
            &[CartAction::SetShippingAddress {
                address: address("Paris", "fr"),
            }],
        );
        assert_eq!(plan.len(), 2);
        assert!(matches!(
            &plan[0],
            CartUpdateAction::SetShippingAddress { address: Some(a) } if a.country == "FR"
        ));
        assert_eq!(
            plan[1],
            CartUpdateAction::SetShippingMethod {
                shipping_method: None
            }
        );
    }

    #[test]
    fn test_country_change_with_new_method_keeps_it() {
        let plan = plan_update(
            &with_method_and_code(),
            &[
                CartAction::SetShippingAddress {
                    address: address("Paris", "FR"),
                },
                CartAction::SetShippingMethod {
                    shipping_method_id: "sm-2".to_string(),
                },
            ],
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan[1],
            CartUpdateAction::SetShippingMethod {
                shipping_method: Some(Reference::new("shipping-method", "sm-2"))
            }
        );
    }

    #[test]
    fn test_same_shipping_method_is_skipped() {
        let plan = plan_update(
            &with_method_and_code(),
            &[CartAction::SetShippingMethod {
                shipping_method_id: "sm-1".to_string(),
            }],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_attached_payment_is_skipped() {
        let cart = cart(&serde_json::json!({
            "paymentInfo": {"payments": [{"typeId": "payment", "id": "pay-1"}]}
        }));
        assert!(
            plan_update(
                &cart,
                &[CartAction::AddPayment {
                    payment_id: "pay-1".to_string()
                }]
            )
            .is_empty()
        );
        assert_eq!(
            plan_update(
                &cart,
                &[CartAction::AddPayment {
                    payment_id: "pay-2".to_string()
                }]
            )
            .len(),
            1
        );
    }

    #[test]
    fn test_validate() {
        assert!(matches!(validate(&[]), Err(AppError::RequiredField(_))));
        assert!(matches!(
            validate(&[CartAction::AddLineItem {
                sku: " ".to_string(),
                quantity: 1
            }]),
            Err(AppError::RequiredField(field)) if field == "sku"
        ));
        assert!(matches!(
            validate(&[CartAction::ChangeLineItemQuantity {
                line_item_id: "line-1".to_string(),
                quantity: -1
            }]),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate(&[CartAction::SetCustomerEmail {
                email: "not-an-email".to_string()
            }]),
            Err(AppError::BadRequest(_))
        ));
        assert!(
            validate(&[CartAction::SetShippingMethod {
                shipping_method_id: "sm-1".to_string()
            }])
            .is_ok()
        );
    }
}
