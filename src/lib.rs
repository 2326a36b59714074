// Library crate for resolving the product catalog and downloading package sets

pub mod catalog;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod orchestrator;
pub mod platform;
pub mod resolver;

pub use error::{Error, Result};
