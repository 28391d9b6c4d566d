//! faktura-core: Shared infrastructure for the faktura billing services.
pub mod error;
pub mod middleware;
pub mod utils;
