//! Pool snapshot caching and offline quoting (C2, C3).
//!
//! Author: AI-Generated
//! Created: 2026-01-29

pub mod cache;
pub mod quote;

pub use cache::{PoolCache, PoolKey};
pub use quote::{quote_exact_input, QuoteResult};
