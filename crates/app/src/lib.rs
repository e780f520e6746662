//! Till Application
//!
//! Backend plumbing for the `till` point-of-sale client: HTTP services, the
//! local store, the catalog cache, session persistence and the checkout
//! pipeline with its stock reconciliation.

pub mod backend;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod context;
pub mod observability;
pub mod services;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test;
