//! apichain-runner: catalog loading and HTTP execution for apichain

pub mod catalog;
pub mod http;

pub use catalog::{CatalogError, load as load_catalog};
pub use http::HttpExecutor;
