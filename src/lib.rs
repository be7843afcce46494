//! SmartHVAC
//!
//! The cart and checkout core of the SmartHVAC storefront: a persisted shopping cart,
//! a read-only product catalog and a simulated checkout that turns the cart into an
//! order. No payment gateway is ever contacted.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod pricing;
pub mod receipt;
pub mod store;
pub mod storefront;
