//! PIM export parser.
//!
//! Products carry a text attribute holding the raw JSON export of the PIM
//! system:
//!
//! ```json
//! {
//!   "identifier": "TR-42",
//!   "family": "shoes",
//!   "values": {
//!     "description": [{"locale": "en_GB", "scope": "ecommerce", "data": "..."}],
//!     "weight": [{"locale": null, "scope": null, "data": {"amount": "0.8500", "unit": "KILOGRAM"}}]
//!   }
//! }
//! ```
//!
//! Each attribute holds one value per locale/scope pair. We pick the best
//! value for the shop's locale and channel, lift a handful of well-known
//! codes into dedicated fields and render everything else as labelled
//! specifications.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use shopfront_core::{PimAttributes, Specification};
use tracing::warn;

const DESCRIPTION_CODES: &[&str] = &["description", "marketing_description"];
const FEATURE_CODES: &[&str] = &["bullet_points", "features"];
const MATERIAL_CODES: &[&str] = &["material", "materials"];
const CARE_CODE: &str = "care_instructions";

#[derive(Debug, Deserialize)]
struct PimExport {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    values: Option<BTreeMap<String, Vec<PimValue>>>,
}

#[derive(Debug, Deserialize)]
struct PimValue {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Parse a PIM export blob for a locale and channel.
///
/// Returns `None` (and logs a warning) when the blob is not valid JSON or has
/// no `values` object.
#[must_use]
pub fn parse_pim_blob(blob: &str, locale: &str, channel: &str) -> Option<PimAttributes> {
    let export: PimExport = match serde_json::from_str(blob) {
        Ok(export) => export,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed PIM blob");
            return None;
        }
    };

    let Some(values) = export.values else {
        warn!(identifier = ?export.identifier, "PIM blob has no values");
        return None;
    };

    let mut attributes = PimAttributes {
        identifier: export.identifier,
        family: export.family,
        ..Default::default()
    };

    let selected: BTreeMap<&str, &Value> = values
        .iter()
        .filter_map(|(code, entries)| {
            select_value(entries, locale, channel).map(|value| (code.as_str(), value))
        })
        .collect();

    attributes.description = first_text(&selected, DESCRIPTION_CODES);
    attributes.features = FEATURE_CODES
        .iter()
        .find_map(|code| selected.get(code).map(|v| bullet_list(v)))
        .unwrap_or_default();
    attributes.materials = MATERIAL_CODES
        .iter()
        .find_map(|code| selected.get(code).map(|v| comma_list(v)))
        .unwrap_or_default();
    attributes.care_instructions = first_text(&selected, &[CARE_CODE]);

    // BTreeMap iteration keeps specifications ordered by code
    attributes.specifications = selected
        .iter()
        .filter(|(code, _)| !is_well_known(code))
        .filter_map(|(code, value)| {
            render_value(value).map(|value| Specification {
                label: label_for(code),
                value,
            })
        })
        .collect();

    Some(attributes)
}

fn is_well_known(code: &str) -> bool {
    DESCRIPTION_CODES.contains(&code)
        || FEATURE_CODES.contains(&code)
        || MATERIAL_CODES.contains(&code)
        || code == CARE_CODE
}

/// Pick the value for a locale and channel.
///
/// Order: locale + scope, locale without scope, locale-independent value for
/// the scope, locale-independent value without scope, then the first entry.
fn select_value<'a>(entries: &'a [PimValue], locale: &str, channel: &str) -> Option<&'a Value> {
    let wanted = normalize_locale(locale);
    let locale_is = |entry: &PimValue| {
        entry
            .locale
            .as_deref()
            .is_some_and(|l| normalize_locale(l) == wanted)
    };
    let scope_is = |entry: &PimValue| entry.scope.as_deref() == Some(channel);

    entries
        .iter()
        .find(|e| locale_is(e) && scope_is(e))
        .or_else(|| entries.iter().find(|e| locale_is(e) && e.scope.is_none()))
        .or_else(|| entries.iter().find(|e| e.locale.is_none() && scope_is(e)))
        .or_else(|| {
            entries
                .iter()
                .find(|e| e.locale.is_none() && e.scope.is_none())
        })
        .or_else(|| entries.first())
        .map(|e| &e.data)
}

fn normalize_locale(locale: &str) -> String {
    locale.replace('_', "-").to_lowercase()
}

fn first_text(selected: &BTreeMap<&str, &Value>, codes: &[&str]) -> Option<String> {
    codes.iter().find_map(|code| {
        selected
            .get(code)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Split text into bullet points, stripping leading bullet markers.
fn bullet_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => text
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '•', '*']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => string_items(items),
        _ => Vec::new(),
    }
}

fn comma_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => string_items(items),
        _ => Vec::new(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(render_scalar)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Human label for an attribute code (`country_of_origin` → `Country of origin`).
fn label_for(code: &str) -> String {
    let spaced = code.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            if items.iter().any(is_price) {
                return None;
            }
            let rendered = string_items(items);
            (!rendered.is_empty()).then(|| rendered.join(", "))
        }
        Value::Object(_) => render_metric(value),
        _ => render_scalar(value).filter(|s| !s.is_empty()),
    }
}

fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Price collections are `[{"amount": "...", "currency": "EUR"}]`.
fn is_price(value: &Value) -> bool {
    value.get("currency").is_some() && value.get("amount").is_some()
}

/// Render a metric `{"amount": "0.8500", "unit": "KILOGRAM"}` as `0.85 kg`.
fn render_metric(value: &Value) -> Option<String> {
    let amount = match value.get("amount")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let unit = value.get("unit").and_then(Value::as_str)?;
    Some(format!("{} {}", trim_decimal(&amount), unit_abbreviation(unit)))
}

fn trim_decimal(amount: &str) -> &str {
    if amount.contains('.') {
        amount.trim_end_matches('0').trim_end_matches('.')
    } else {
        amount
    }
}

fn unit_abbreviation(unit: &str) -> String {
    match unit {
        "KILOGRAM" => "kg".to_string(),
        "GRAM" => "g".to_string(),
        "CENTIMETER" => "cm".to_string(),
        "MILLIMETER" => "mm".to_string(),
        "METER" => "m".to_string(),
        "LITER" => "l".to_string(),
        "MILLILITER" => "ml".to_string(),
        other => other.to_lowercase(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn blob(values: &Value) -> String {
        serde_json::json!({
            "identifier": "TR-42",
            "family": "shoes",
            "values": values
        })
        .to_string()
    }

    #[test]
    fn test_malformed_blob_is_none() {
        assert!(parse_pim_blob("not json", "en-GB", "ecommerce").is_none());
        assert!(parse_pim_blob(r#"{"identifier": "x"}"#, "en-GB", "ecommerce").is_none());
    }

    #[test]
    fn test_value_selection_order() {
        let attrs = parse_pim_blob(
            &blob(&serde_json::json!({
                "description": [
                    {"locale": "de_DE", "scope": "ecommerce", "data": "Deutsch"},
                    {"locale": "en_GB", "scope": "print", "data": "Print copy"},
                    {"locale": "en_GB", "scope": null, "data": "Any channel"},
                    {"locale": "en_GB", "scope": "ecommerce", "data": "Web copy"}
                ],
                "care_instructions": [
                    {"locale": "de_DE", "scope": null, "data": "Nicht waschen"},
                    {"locale": null, "scope": null, "data": "Hand wash only"}
                ]
            })),
            "en-GB",
            "ecommerce",
        )
        .unwrap();

        assert_eq!(attrs.identifier.as_deref(), Some("TR-42"));
        assert_eq!(attrs.description.as_deref(), Some("Web copy"));
        assert_eq!(attrs.care_instructions.as_deref(), Some("Hand wash only"));
    }

    #[test]
    fn test_locale_without_scope_beats_unlocalized() {
        let entries: Vec<PimValue> = serde_json::from_value(serde_json::json!([
            {"locale": null, "scope": "ecommerce", "data": "global"},
            {"locale": "en_GB", "scope": null, "data": "english"}
        ]))
        .unwrap();
        assert_eq!(
            select_value(&entries, "en-GB", "ecommerce"),
            Some(&Value::String("english".to_string()))
        );
        // No locale match at all falls back to the first entry
        assert_eq!(
            select_value(&entries[1..], "fr-FR", "ecommerce"),
            Some(&Value::String("english".to_string()))
        );
    }

    #[test]
    fn test_features_strip_bullets() {
        let attrs = parse_pim_blob(
            &blob(&serde_json::json!({
                "bullet_points": [{"locale": null, "scope": null, "data": "- Waterproof\n• Breathable\n\n* Vegan  \n"}]
            })),
            "en-GB",
            "ecommerce",
        )
        .unwrap();
        assert_eq!(attrs.features, vec!["Waterproof", "Breathable", "Vegan"]);
    }

    #[test]
    fn test_materials_from_text_or_array() {
        let from_text = parse_pim_blob(
            &blob(&serde_json::json!({
                "material": [{"locale": null, "scope": null, "data": "Leather, Rubber ,"}]
            })),
            "en-GB",
            "ecommerce",
        )
        .unwrap();
        assert_eq!(from_text.materials, vec!["Leather", "Rubber"]);

        let from_array = parse_pim_blob(
            &blob(&serde_json::json!({
                "materials": [{"locale": null, "scope": null, "data": ["Wool", "Silk"]}]
            })),
            "en-GB",
            "ecommerce",
        )
        .unwrap();
        assert_eq!(from_array.materials, vec!["Wool", "Silk"]);
    }

    #[test]
    fn test_specifications_rendering() {
        let attrs = parse_pim_blob(
            &blob(&serde_json::json!({
                "weight": [{"locale": null, "scope": null, "data": {"amount": "0.8500", "unit": "KILOGRAM"}}],
                "country_of_origin": [{"locale": null, "scope": null, "data": "PT"}],
                "vegan": [{"locale": null, "scope": null, "data": false}],
                "sizes": [{"locale": null, "scope": null, "data": ["40", "41", "42"]}],
                "pack_size": [{"locale": null, "scope": null, "data": 2}],
                "height": [{"locale": null, "scope": null, "data": {"amount": 12, "unit": "INCH"}}],
                "price": [{"locale": null, "scope": null, "data": [{"amount": "89.00", "currency": "EUR"}]}],
                "notes": [{"locale": null, "scope": null, "data": "   "}],
                "legacy": [{"locale": null, "scope": null, "data": null}]
            })),
            "en-GB",
            "ecommerce",
        )
        .unwrap();

        let rendered: Vec<(&str, &str)> = attrs
            .specifications
            .iter()
            .map(|s| (s.label.as_str(), s.value.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("Country of origin", "PT"),
                ("Height", "12 inch"),
                ("Pack size", "2"),
                ("Sizes", "40, 41, 42"),
                ("Vegan", "No"),
                ("Weight", "0.85 kg"),
            ]
        );
    }

    #[test]
    fn test_label_for() {
        assert_eq!(label_for("country_of_origin"), "Country of origin");
        assert_eq!(label_for("ean"), "Ean");
        assert_eq!(label_for(""), "");
    }

    #[test]
    fn test_trim_decimal() {
        assert_eq!(trim_decimal("0.8500"), "0.85");
        assert_eq!(trim_decimal("12.0000"), "12");
        assert_eq!(trim_decimal("100"), "100");
    }
}
