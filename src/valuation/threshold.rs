use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::comps::sample_stddev;
use crate::config::ValuatorConfig;
use crate::types::{CompStats, SaleRecord};

/// Comps needed before the threshold adapts to the data.
pub const MIN_COMPS_FOR_ADAPTATION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    None,
    /// stddev above 20% of median
    Dispersion,
    /// fewer than one sale per 20 days
    LowVelocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdChoice {
    pub value: Decimal,
    pub adjustment: Adjustment,
}

impl ThresholdChoice {
    fn base(value: Decimal) -> Self {
        Self { value, adjustment: Adjustment::None }
    }
}

pub fn select_threshold(cfg: &ValuatorConfig, stats: &CompStats, sales: &[SaleRecord]) -> ThresholdChoice {
    let base = cfg.base_threshold;
    if !cfg.use_dynamic_threshold || stats.count < MIN_COMPS_FOR_ADAPTATION {
        return ThresholdChoice::base(base);
    }
    let median = match stats.median {
        Some(m) => m,
        None => return ThresholdChoice::base(base),
    };

    let stddev = sample_stddev(sales);
    let velocity = Decimal::from(stats.count) / Decimal::from(cfg.history_window_days.max(1));

    if stddev > dec!(0.2) * median {
        return ThresholdChoice {
            value: (base + dec!(0.10)).min(dec!(0.95)),
            adjustment: Adjustment::Dispersion,
        };
    }
    if velocity < dec!(0.05) {
        return ThresholdChoice {
            value: (base + dec!(0.05)).min(dec!(0.90)),
            adjustment: Adjustment::LowVelocity,
        };
    }
    ThresholdChoice::base(base)
}
