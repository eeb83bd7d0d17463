//! Sweeps retailer pages for on-topic discount listings.
//!
//! Page content flows through a tiered extractor, is normalized into
//! [`DealRecord`]s, deduplicated per retailer, then handed to a persistence
//! sink and an optional notifier.

pub mod config;
pub mod dedupe;
pub mod errors;
pub mod fetchers;
pub mod filter;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod sinks;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use pipeline::ExtractionPipeline;
pub use results::{DealRecord, RunResult};
