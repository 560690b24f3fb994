//! Localized string resolution.

use crate::commerce::types::LocalizedString;

/// Resolve a localized string.
///
/// Tries the exact locale (`en-GB` and `en_GB` are equivalent, case is
/// ignored), then any entry for the same language, then the first entry.
#[must_use]
pub fn localize<'a>(values: &'a LocalizedString, locale: &str) -> Option<&'a str> {
    let wanted = normalize(locale);
    let language = wanted.split('-').next().unwrap_or_default();

    values
        .iter()
        .find(|(key, _)| normalize(key) == wanted)
        .or_else(|| {
            values
                .iter()
                .find(|(key, _)| normalize(key).split('-').next() == Some(language))
        })
        .or_else(|| values.iter().next())
        .map(|(_, value)| value.as_str())
}

/// Resolve a localized string, falling back to an empty string.
#[must_use]
pub fn localize_or_default(values: &LocalizedString, locale: &str) -> String {
    localize(values, locale).unwrap_or_default().to_string()
}

fn normalize(locale: &str) -> String {
    locale.replace('_', "-").to_lowercase()
}
