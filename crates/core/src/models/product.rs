//! Product view models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pim::PimAttributes;
use super::price::PriceModel;

/// A purchasable product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantModel {
    pub id: i64,
    pub sku: Option<String>,
    pub price: Option<PriceModel>,
    pub images: Vec<String>,
    /// Simple attributes rendered as text, keyed by attribute name.
    pub attributes: BTreeMap<String, String>,
    pub available: bool,
}

/// A product with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductModel {
    pub id: String,
    pub key: Option<String>,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub master_variant: VariantModel,
    pub variants: Vec<VariantModel>,
    pub details: Option<PimAttributes>,
}

impl ProductModel {
    /// First image of the master variant.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.master_variant.images.first().map(String::as_str)
    }

    /// Master variant followed by the other variants.
    pub fn all_variants(&self) -> impl Iterator<Item = &VariantModel> {
        std::iter::once(&self.master_variant).chain(self.variants.iter())
    }
}

/// One page of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListModel {
    pub products: Vec<ProductModel>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

impl ProductListModel {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.offset + self.limit < self.total
    }
}
