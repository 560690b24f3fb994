//! Storefront-only models.
//!
//! View models shared with the BFF live in `shopfront_core`; this module only
//! holds what the storefront keeps in its own session.

pub mod session;

pub use session::{CheckoutStep, Flash, FlashKind, keys as session_keys};
