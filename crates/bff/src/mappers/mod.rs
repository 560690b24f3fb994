//! Vendor type → view model mapping.
//!
//! Every function here is pure: it takes vendor wire types (and the shop
//! defaults it needs) and returns a `shopfront_core` view model. No I/O,
//! no logging beyond the PIM parser's warnings.

pub mod address;
pub mod cart;
pub mod discount;
pub mod locale;
pub mod order;
pub mod payment;
pub mod price;
pub mod product;
pub mod shipping;

pub use address::{map_address, to_commerce_address};
pub use cart::map_cart;
pub use discount::{discount_total, map_discounts};
pub use locale::localize;
pub use order::map_order;
pub use payment::{map_payment, map_payment_method, map_result_code};
pub use price::{map_money, map_price, select_price};
pub use product::{map_product, map_product_list};
pub use shipping::map_shipping_method;
