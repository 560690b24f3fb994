//! Cache types for commerce API responses.

use super::types::ProductProjection;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<ProductProjection>),
}

/// Cache key for a product looked up by ID.
pub fn product_key(id: &str) -> String {
    format!("product:{id}")
}

/// Cache key for a product looked up by its key.
pub fn product_by_key_key(key: &str) -> String {
    format!("product-key:{key}")
}
