use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::comps::compute_stats;
use super::threshold::{select_threshold, MIN_COMPS_FOR_ADAPTATION};
use super::{Blacklist, ListingSink, SalesHistory};
use crate::config::ValuatorConfig;
use crate::error::ValuationError;
use crate::types::{CompStats, ListingQuery, Outcome, Verdict};

const RAW_SKIP_MSG: &str =
    "Analysis skipped: Pricing for raw cards is highly subjective and not reliably comparable.";
const BLACKLISTED_MSG: &str = "Suppressed: This card/grade is blacklisted for deal alerts.";

/// How much comparable evidence a window holds, with the numbers each case reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NoComps,
    LowVolume {
        count: usize,
        median: Decimal,
        min: Decimal,
        max: Decimal,
    },
    Sufficient {
        count: usize,
        median: Decimal,
        mean: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

impl Classification {
    pub fn from_stats(stats: &CompStats) -> Self {
        let (median, mean, min, max) = match (stats.median, stats.mean, stats.min, stats.max) {
            (Some(md), Some(mn), Some(lo), Some(hi)) if stats.count > 0 => (md, mn, lo, hi),
            _ => return Classification::NoComps,
        };
        if stats.count < MIN_COMPS_FOR_ADAPTATION {
            Classification::LowVolume { count: stats.count, median, min, max }
        } else {
            Classification::Sufficient { count: stats.count, median, mean, min, max }
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Classification::NoComps => Outcome::NoComps,
            Classification::LowVolume { .. } => Outcome::LowVolume,
            Classification::Sufficient { .. } => Outcome::SufficientComps,
        }
    }

    /// Returns the undervalued flag and the explanation for it.
    pub fn render(&self, asking: Decimal, threshold: Decimal, window_days: u32, currency: &str) -> (bool, String) {
        match *self {
            Classification::NoComps => (
                false,
                format!(
                    "No recent sales comps found for this exact card/grade in the last {} days.",
                    window_days
                ),
            ),
            Classification::LowVolume { count, median, min, max } => {
                let flagged = asking < median * threshold;
                let mut msg = format!(
                    "Found {} comp(s) (Min: {}, Max: {}). Median: {}. Low volume, use caution.",
                    count,
                    money(min, currency),
                    money(max, currency),
                    money(median, currency)
                );
                if flagged {
                    msg.push_str(" Listing price is below threshold.");
                } else {
                    msg.push_str(" Listing price is NOT below threshold.");
                }
                (flagged, msg)
            }
            Classification::Sufficient { count, median, mean, min, max } => {
                let limit = median * threshold;
                let flagged = asking < limit;
                let mut msg = format!(
                    "Found {} comps. Median Price: {} (Avg: {}, Range: {}-{}).",
                    count,
                    money(median, currency),
                    money(mean, currency),
                    money(min, currency),
                    money(max, currency)
                );
                if flagged {
                    msg.push_str(&format!(
                        " Listing price {} is below the {}% threshold ({}). Potential deal!",
                        money(asking, currency),
                        (threshold * dec!(100)).round_dp(0).normalize(),
                        money(limit, currency)
                    ));
                } else {
                    msg.push_str(&format!(
                        " Listing price {} is within the normal range based on recent comps.",
                        money(asking, currency)
                    ));
                }
                (flagged, msg)
            }
        }
    }
}

fn money(amount: Decimal, currency: &str) -> String {
    let amount = amount.round_dp(2);
    if currency.eq_ignore_ascii_case("USD") {
        format!("${:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}

struct Checked<'q> {
    item_id: &'q str,
    asking: Decimal,
    /// `None` for raw cards
    graded: Option<(&'q str, &'q str)>,
}

fn validate(q: &ListingQuery) -> Result<Checked<'_>, ValuationError> {
    let mut missing: Vec<&str> = vec![];

    let item_id = q.item_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if item_id.is_none() {
        missing.push("item_id");
    }
    if q.asking_price.is_none() {
        missing.push("asking_price");
    }
    let company = q.grading_company.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if !q.is_raw() && company.is_none() {
        missing.push("grading_company");
    }

    match (item_id, q.asking_price) {
        (Some(item_id), Some(asking)) if missing.is_empty() => {
            if asking <= Decimal::ZERO {
                return Err(ValuationError::Validation(format!(
                    "asking price must be positive, got {}",
                    asking
                )));
            }
            let graded = match (q.is_raw(), q.grade.as_deref(), company) {
                (false, Some(grade), Some(company)) => Some((grade, company)),
                _ => None,
            };
            Ok(Checked { item_id, asking, graded })
        }
        _ => Err(ValuationError::Validation(format!(
            "missing fields [{}] in listing query",
            missing.join(", ")
        ))),
    }
}

/// Values listings against recent comparable sales.
#[derive(Clone)]
pub struct Valuator {
    sales: Arc<dyn SalesHistory>,
    blacklist: Arc<dyn Blacklist>,
    sink: Option<Arc<dyn ListingSink>>,
}

impl Valuator {
    pub fn new(sales: Arc<dyn SalesHistory>, blacklist: Arc<dyn Blacklist>) -> Self {
        Self { sales, blacklist, sink: None }
    }

    /// Attach a store that receives the comp value and flag after each full evaluation.
    pub fn with_sink(mut self, sink: Arc<dyn ListingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn evaluate(&self, query: &ListingQuery, cfg: &ValuatorConfig) -> Verdict {
        self.evaluate_at(query, cfg, Utc::now())
    }

    pub fn evaluate_at(&self, query: &ListingQuery, cfg: &ValuatorConfig, now: DateTime<Utc>) -> Verdict {
        let early = |outcome: Outcome, message: String| Verdict {
            outcome,
            is_undervalued: false,
            message,
            stats: CompStats::default(),
            threshold_used: cfg.base_threshold,
            window_days: cfg.history_window_days,
        };

        let checked = match validate(query) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(item_id = ?query.item_id, error = %e, "listing rejected");
                return early(Outcome::Invalid, e.to_string());
            }
        };
        let item_id = checked.item_id;

        let (grade, company) = match checked.graded {
            Some(g) => g,
            None => {
                tracing::debug!(item_id = %item_id, grade = ?query.grade, "raw card skipped");
                return early(Outcome::RawSkipped, RAW_SKIP_MSG.to_string());
            }
        };

        if self.blacklist.is_blacklisted(item_id, grade) {
            tracing::debug!(item_id = %item_id, grade = %grade, "blacklisted, alert suppressed");
            return early(Outcome::Blacklisted, BLACKLISTED_MSG.to_string());
        }

        let since = now - Duration::days(i64::from(cfg.history_window_days));
        let mut sales = match self.sales.fetch(item_id, grade, company, since) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(item_id = %item_id, grade = %grade, error = %e, "sales history unavailable");
                let reason = match e {
                    ValuationError::Retrieval(reason) => reason,
                    other => other.to_string(),
                };
                return early(Outcome::RetrievalFailed, ValuationError::Retrieval(reason).to_string());
            }
        };
        // window is [since, now]; lookups only bound the start
        sales.retain(|s| s.sold_at >= since && s.sold_at <= now);

        let stats = compute_stats(&sales);
        let threshold = select_threshold(cfg, &stats, &sales);
        let class = Classification::from_stats(&stats);
        let (is_undervalued, message) =
            class.render(checked.asking, threshold.value, cfg.history_window_days, &query.currency);

        tracing::debug!(
            item_id = %item_id,
            grade = %grade,
            comps = stats.count,
            median = ?stats.median,
            threshold = %threshold.value,
            adjustment = ?threshold.adjustment,
            "comps evaluated"
        );
        if is_undervalued {
            tracing::info!(
                item_id = %item_id,
                grade = %grade,
                asking = %checked.asking,
                median = ?stats.median,
                threshold = %threshold.value,
                "undervalued listing"
            );
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.update_comp_value(item_id, stats.median, is_undervalued) {
                tracing::warn!(item_id = %item_id, error = %e, "comp value write-back failed");
            }
        }

        Verdict {
            outcome: class.outcome(),
            is_undervalued,
            message,
            stats,
            threshold_used: threshold.value,
            window_days: cfg.history_window_days,
        }
    }
}
