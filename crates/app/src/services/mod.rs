//! Backend services
//!
//! One trait per backend collection, each with an HTTP implementation over
//! [`BackendClient`](crate::backend::BackendClient). Checkout and the CLI only
//! depend on the traits, so tests swap in the generated mocks.

pub mod brands;
pub mod categories;
pub mod errors;
pub mod models;
pub mod products;
pub mod sales;
pub mod users;

pub use brands::*;
pub use categories::*;
pub use errors::ServiceError;
pub use products::*;
pub use sales::*;
pub use users::*;
