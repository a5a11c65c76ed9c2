//! HTTP clients for the storefront backend.

mod cart;
#[cfg(test)]
pub(crate) mod stub;

pub use cart::{ApiResponse, CartApi, CartLine, TOP_PRODUCTS_INCLUDE};
