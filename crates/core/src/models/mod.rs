//! Display-oriented view models and BFF request bodies.
//!
//! View models are flat projections of vendor data built per request by the
//! BFF mappers. They carry no behavior beyond a few display helpers.

pub mod address;
pub mod cart;
pub mod order;
pub mod payment;
pub mod pim;
pub mod price;
pub mod product;
pub mod requests;
pub mod shipping;

pub use address::AddressModel;
pub use cart::{CartModel, DiscountModel, LineItemModel, ShippingInfoModel};
pub use order::OrderModel;
pub use payment::{PaymentMethodModel, PaymentModel, PaymentStatus, RedirectAction};
pub use pim::{PimAttributes, Specification};
pub use price::PriceModel;
pub use product::{ProductListModel, ProductModel, VariantModel};
pub use requests::{
    CartAction, CreateCartRequest, CreateOrderRequest, NewLineItem, PaymentDetailsRequest,
    StartPaymentRequest, UpdateCartRequest,
};
pub use shipping::ShippingMethodModel;
