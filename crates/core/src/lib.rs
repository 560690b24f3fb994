//! Shopfront Core - Shared types library.
//!
//! This crate provides the types shared by both Shopfront binaries:
//! - `bff` - Backend-for-frontend JSON service over the commerce platform
//! - `storefront` - Server-rendered customer-facing site
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The BFF
//! serializes these view models and the storefront deserializes them, so the
//! JSON contract between the two lives in one place.
//!
//! # Modules
//!
//! - [`types`] - Money with decimal formatting
//! - [`models`] - Display-oriented view models (cart, product, order, ...)
//! - [`error`] - JSON error envelope returned by the BFF

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod models;
pub mod types;

pub use error::{ErrorBody, ErrorDetail};
pub use models::*;
pub use types::*;
