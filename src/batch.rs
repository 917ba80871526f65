use serde::Serialize;

use crate::config::ValuatorConfig;
use crate::stats::RunStats;
use crate::types::{ActiveListing, Verdict};
use crate::valuation::Valuator;

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub listing: ActiveListing,
    pub verdict: Verdict,
}

/// Values every listing in order and logs the deals found.
pub fn evaluate_active(
    valuator: &Valuator,
    listings: Vec<ActiveListing>,
    cfg: &ValuatorConfig,
    stats: &RunStats,
) -> Vec<BatchItem> {
    tracing::info!(listings = listings.len(), "analyzing active listings");

    let mut out = Vec::with_capacity(listings.len());
    for listing in listings {
        let verdict = valuator.evaluate(&listing.query(), cfg);
        stats.record(&verdict);

        if verdict.is_undervalued {
            tracing::info!(
                item_id = %listing.item_id,
                title = %listing.title,
                price = %listing.asking_price,
                grade = ?listing.grade,
                source = %listing.source,
                url = %listing.source_url,
                reason = %verdict.message,
                "deal found"
            );
        } else {
            tracing::debug!(
                item_id = %listing.item_id,
                price = %listing.asking_price,
                grade = ?listing.grade,
                outcome = ?verdict.outcome,
                "not a deal"
            );
        }
        out.push(BatchItem { listing, verdict });
    }

    let deals = out.iter().filter(|i| i.verdict.is_undervalued).count();
    tracing::info!(evaluated = out.len(), deals, "analysis complete");
    out
}
