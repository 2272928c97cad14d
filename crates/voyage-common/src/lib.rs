//! Voyage Common - Shared utilities and types
//!
//! This crate provides the error type, configuration structs, constants
//! and small helpers used across all Voyage components.

pub mod config;
pub mod constants;
pub mod error;
pub mod pricing;
pub mod utils;

// Re-export commonly used items
pub use config::{ApiKeys, ServerConfig, VoyageConfig};
pub use constants::*;
pub use error::{Result, VoyageError};
pub use pricing::{PricingConfig, TokenPricing};
pub use utils::*;
