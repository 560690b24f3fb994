//! Core value types for Shopfront.

pub mod money;

pub use money::Money;
