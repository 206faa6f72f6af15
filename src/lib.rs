//! Bounded, faceted credential and topic search over a Tantivy index

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
