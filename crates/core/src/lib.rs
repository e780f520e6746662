//! Till
//!
//! Point-of-sale domain for a cashier front-end: carts and their price
//! rounding rules, catalog models, sale records, till sessions, catalog
//! browsing and receipt rendering. Everything in this crate is synchronous
//! and free of network access; the backend plumbing lives in `till-app`.

pub mod browse;
pub mod cart;
pub mod catalog;
pub mod ids;
pub mod money;
pub mod receipt;
pub mod rounding;
pub mod sales;
pub mod session;
pub mod stock;
