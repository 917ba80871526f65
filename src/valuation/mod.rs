pub mod comps;
pub mod threshold;
pub mod valuator;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ValuationError;
use crate::types::SaleRecord;

/// Historical sales lookup for one item/grade/grading company.
pub trait SalesHistory: Send + Sync {
    fn fetch(
        &self,
        item_id: &str,
        grade: &str,
        grading_company: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, ValuationError>;
}

/// Item/grade pairs that must never alert. Implementations fail open.
pub trait Blacklist: Send + Sync {
    fn is_blacklisted(&self, item_id: &str, grade: &str) -> bool;
}

/// Receives the comp value and flag for a stored listing.
pub trait ListingSink: Send + Sync {
    fn update_comp_value(
        &self,
        item_id: &str,
        median: Option<Decimal>,
        is_undervalued: bool,
    ) -> Result<(), ValuationError>;
}

pub use comps::compute_stats;
pub use threshold::{select_threshold, Adjustment, ThresholdChoice};
pub use valuator::{Classification, Valuator};
