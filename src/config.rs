use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub history_window_days: u32,
    pub base_threshold: String,
    pub use_dynamic_threshold: bool,

    pub blacklist_path: String,
    pub listings_path: String,
    pub sales_path: String,

    // Write median/flag back onto stored listings
    pub write_back: bool,

    // Optional JSONL sink for verdicts and run stats
    pub verdicts_jsonl_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let c = config::Config::builder()
            .set_default("history_window_days", 90)?
            .set_default("base_threshold", "0.85")?
            .set_default("use_dynamic_threshold", true)?
            .set_default("blacklist_path", "config/blacklist.yaml")?
            .set_default("listings_path", "data/active_listings.json")?
            .set_default("sales_path", "data/sales_history.json")?
            .set_default("write_back", true)?
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }

    pub fn valuator_config(&self) -> anyhow::Result<ValuatorConfig> {
        let base = self.base_threshold.trim().parse::<Decimal>()?;
        ValuatorConfig::new(self.history_window_days, base, self.use_dynamic_threshold)
    }
}

/// Per-call valuation knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuatorConfig {
    pub history_window_days: u32,
    /// Fraction of median below which a listing is flagged.
    pub base_threshold: Decimal,
    pub use_dynamic_threshold: bool,
}

impl Default for ValuatorConfig {
    fn default() -> Self {
        Self {
            history_window_days: 90,
            base_threshold: dec!(0.85),
            use_dynamic_threshold: true,
        }
    }
}

impl ValuatorConfig {
    pub fn new(history_window_days: u32, base_threshold: Decimal, use_dynamic_threshold: bool) -> anyhow::Result<Self> {
        if history_window_days == 0 {
            anyhow::bail!("history_window_days must be at least 1");
        }
        if base_threshold <= Decimal::ZERO || base_threshold > Decimal::ONE {
            anyhow::bail!("base_threshold must be in (0, 1], got {}", base_threshold);
        }
        Ok(Self {
            history_window_days,
            base_threshold,
            use_dynamic_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base: &str, window: u32) -> Settings {
        Settings {
            history_window_days: window,
            base_threshold: base.to_string(),
            use_dynamic_threshold: false,
            blacklist_path: String::new(),
            listings_path: String::new(),
            sales_path: String::new(),
            write_back: false,
            verdicts_jsonl_path: None,
        }
    }

    #[test]
    fn parses_threshold() {
        let c = settings(" 0.80 ", 30).valuator_config().unwrap();
        assert_eq!(c.base_threshold, dec!(0.80));
        assert_eq!(c.history_window_days, 30);
        assert!(!c.use_dynamic_threshold);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(settings("0", 90).valuator_config().is_err());
        assert!(settings("1.2", 90).valuator_config().is_err());
        assert!(settings("abc", 90).valuator_config().is_err());
        assert!(settings("0.85", 0).valuator_config().is_err());
        assert!(settings("1", 90).valuator_config().is_ok());
    }

    #[test]
    fn defaults() {
        let c = ValuatorConfig::default();
        assert_eq!(c.history_window_days, 90);
        assert_eq!(c.base_threshold, dec!(0.85));
        assert!(c.use_dynamic_threshold);
    }
}
