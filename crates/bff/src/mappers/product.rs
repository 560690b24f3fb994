//! Product mapping.

use std::collections::BTreeMap;

use serde_json::Value;
use shopfront_core::{ProductListModel, ProductModel, VariantModel};

use super::locale::{localize, localize_or_default};
use super::price::{map_price, select_price};
use crate::commerce::types::{PagedQueryResponse, ProductProjection, ProductVariant};
use crate::config::ShopConfig;
use crate::pim::parse_pim_blob;

/// Map a product projection for the shop's locale, currency and country.
///
/// The PIM export attribute is parsed into `details` and left out of the
/// plain variant attributes.
#[must_use]
pub fn map_product(product: &ProductProjection, shop: &ShopConfig) -> ProductModel {
    let details = product
        .master_variant
        .attributes
        .iter()
        .find(|a| a.name == shop.pim_attribute)
        .and_then(|a| a.value.as_str())
        .and_then(|blob| parse_pim_blob(blob, &shop.locale, &shop.pim_channel))
        .filter(|details| !details.is_empty());

    ProductModel {
        id: product.id.clone(),
        key: product.key.clone(),
        slug: localize_or_default(&product.slug, &shop.locale),
        name: localize_or_default(&product.name, &shop.locale),
        description: product
            .description
            .as_ref()
            .and_then(|d| localize(d, &shop.locale))
            .map(str::to_string),
        master_variant: map_variant(&product.master_variant, shop),
        variants: product
            .variants
            .iter()
            .map(|v| map_variant(v, shop))
            .collect(),
        details,
    }
}

/// Map a page of product projections.
#[must_use]
pub fn map_product_list(page: &PagedQueryResponse<ProductProjection>, shop: &ShopConfig) -> ProductListModel {
    ProductListModel {
        products: page.results.iter().map(|p| map_product(p, shop)).collect(),
        total: page.total.unwrap_or(page.offset + page.count),
        offset: page.offset,
        limit: page.limit,
    }
}

fn map_variant(variant: &ProductVariant, shop: &ShopConfig) -> VariantModel {
    VariantModel {
        id: variant.id,
        sku: variant.sku.clone(),
        price: select_price(&variant.prices, &shop.currency, &shop.country).map(map_price),
        images: variant.images.iter().map(|i| i.url.clone()).collect(),
        attributes: variant
            .attributes
            .iter()
            .filter(|a| a.name != shop.pim_attribute)
            .filter_map(|a| {
                attribute_text(&a.value, &shop.locale).map(|text| (a.name.clone(), text))
            })
            .collect::<BTreeMap<_, _>>(),
        available: variant
            .availability
            .as_ref()
            .and_then(|a| a.is_on_stock)
            .unwrap_or(true),
    }
}

/// Render a simple attribute value as text.
///
/// Handles plain scalars, localized strings and enum values
/// (`{"key": .., "label": ..}` with a plain or localized label).
fn attribute_text(value: &Value, locale: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        Value::Object(map) => {
            if let Some(label) = map.get("label") {
                return attribute_text(label, locale);
            }
            let localized = map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<BTreeMap<_, _>>();
            localize(&localized, locale).map(str::to_string)
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn projection() -> ProductProjection {
        let pim = serde_json::json!({
            "identifier": "TR-42",
            "family": "shoes",
            "values": {
                "description": [{"locale": "en_GB", "scope": "ecommerce", "data": "A trainer for every day."}],
                "sole": [{"locale": null, "scope": null, "data": "Rubber"}]
            }
        })
        .to_string();

        serde_json::from_value(serde_json::json!({
            "id": "prod-1",
            "key": "trainer",
            "version": 3,
            "name": {"en-GB": "Trainer", "de-DE": "Turnschuh"},
            "slug": {"en-GB": "trainer"},
            "description": {"en": "Everyday trainer"},
            "masterVariant": {
                "id": 1,
                "sku": "TR-42",
                "prices": [
                    {"value": {"currencyCode": "EUR", "centAmount": 8900, "fractionDigits": 2}},
                    {"value": {"currencyCode": "EUR", "centAmount": 8500, "fractionDigits": 2}, "country": "DE"}
                ],
                "images": [{"url": "https://img.test/tr.jpg"}],
                "attributes": [
                    {"name": "color", "value": {"key": "red", "label": {"en-GB": "Red", "de-DE": "Rot"}}},
                    {"name": "size", "value": "42"},
                    {"name": "pimData", "value": pim}
                ],
                "availability": {"isOnStock": true, "availableQuantity": 4}
            },
            "variants": [
                {"id": 2, "sku": "TR-43", "availability": {"isOnStock": false}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_map_product() {
        let model = map_product(&projection(), &ShopConfig::default());

        assert_eq!(model.name, "Trainer");
        assert_eq!(model.description.as_deref(), Some("Everyday trainer"));
        assert_eq!(model.image_url(), Some("https://img.test/tr.jpg"));

        let master = &model.master_variant;
        assert_eq!(master.price.as_ref().unwrap().value.cent_amount, 8500);
        assert_eq!(master.attributes.get("color").map(String::as_str), Some("Red"));
        assert_eq!(master.attributes.get("size").map(String::as_str), Some("42"));
        assert!(!master.attributes.contains_key("pimData"));
        assert!(master.available);

        assert!(!model.variants[0].available);
        assert!(model.variants[0].price.is_none());
    }

    #[test]
    fn test_map_product_details_from_pim() {
        let model = map_product(&projection(), &ShopConfig::default());
        let details = model.details.unwrap();
        assert_eq!(details.description.as_deref(), Some("A trainer for every day."));
        assert_eq!(details.specifications[0].label, "Sole");
    }

    #[test]
    fn test_map_product_list_total_fallback() {
        let page = PagedQueryResponse {
            limit: 20,
            offset: 20,
            count: 1,
            total: None,
            results: vec![projection()],
        };
        let list = map_product_list(&page, &ShopConfig::default());
        assert_eq!(list.total, 21);
        assert!(!list.has_more());
    }
}
