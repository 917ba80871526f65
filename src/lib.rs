//! Flags trading-card listings priced below recent comparable sales.

pub mod batch;
pub mod config;
pub mod error;
pub mod stats;
pub mod store;
pub mod types;
pub mod valuation;

pub use config::{Settings, ValuatorConfig};
pub use error::ValuationError;
pub use types::{ActiveListing, CompStats, ListingQuery, Outcome, SaleRecord, Verdict};
pub use valuation::Valuator;
