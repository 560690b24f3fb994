//! Address mapping in both directions.

use shopfront_core::AddressModel;

use crate::commerce::types::Address;

/// Vendor address → view model.
#[must_use]
pub fn map_address(address: &Address) -> AddressModel {
    AddressModel {
        first_name: address.first_name.clone(),
        last_name: address.last_name.clone(),
        street_name: address.street_name.clone(),
        street_number: address.street_number.clone(),
        additional_address_info: address.additional_address_info.clone(),
        postal_code: address.postal_code.clone(),
        city: address.city.clone(),
        region: address.region.clone(),
        country: address.country.clone(),
        email: address.email.clone(),
        phone: address.phone.clone(),
    }
}

/// View model → vendor address. Blank fields are dropped and the country is
/// upper-cased.
#[must_use]
pub fn to_commerce_address(address: &AddressModel) -> Address {
    Address {
        first_name: non_blank(address.first_name.as_ref()),
        last_name: non_blank(address.last_name.as_ref()),
        street_name: non_blank(address.street_name.as_ref()),
        street_number: non_blank(address.street_number.as_ref()),
        additional_address_info: non_blank(address.additional_address_info.as_ref()),
        postal_code: non_blank(address.postal_code.as_ref()),
        city: non_blank(address.city.as_ref()),
        region: non_blank(address.region.as_ref()),
        country: address.country.trim().to_uppercase(),
        email: non_blank(address.email.as_ref()),
        phone: non_blank(address.phone.as_ref()),
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_commerce_address_drops_blanks() {
        let model = AddressModel {
            first_name: Some(" Ada ".to_string()),
            last_name: Some(String::new()),
            city: Some("Berlin".to_string()),
            country: "de".to_string(),
            ..Default::default()
        };
        let address = to_commerce_address(&model);
        assert_eq!(address.first_name.as_deref(), Some("Ada"));
        assert!(address.last_name.is_none());
        assert_eq!(address.country, "DE");
    }

    #[test]
    fn test_map_address_copies_fields() {
        let address = Address {
            street_name: Some("Main St".to_string()),
            street_number: Some("5".to_string()),
            country: "GB".to_string(),
            ..Default::default()
        };
        let model = map_address(&address);
        assert_eq!(model.street_line(), "Main St 5");
        assert_eq!(model.country, "GB");
    }
}
