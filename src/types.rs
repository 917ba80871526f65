use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "USD".to_string()
}

/// A listing to value. Identity and price are optional here so that incomplete
/// input can be reported through the verdict instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingQuery {
    #[serde(alias = "card_id")]
    pub item_id: Option<String>,
    pub grade: Option<String>,
    pub grading_company: Option<String>,
    #[serde(alias = "listing_price")]
    pub asking_price: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            item_id: None,
            grade: None,
            grading_company: None,
            asking_price: None,
            currency: default_currency(),
        }
    }
}

impl ListingQuery {
    pub fn new(item_id: &str, grade: Option<&str>, grading_company: Option<&str>, asking_price: Decimal) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            grade: grade.map(str::to_string),
            grading_company: grading_company.map(str::to_string),
            asking_price: Some(asking_price),
            currency: default_currency(),
        }
    }

    /// Ungraded cards (no grade, or "raw") have no reliable comparables.
    pub fn is_raw(&self) -> bool {
        match self.grade.as_deref().map(str::trim) {
            None => true,
            Some(g) => g.eq_ignore_ascii_case("raw"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_price: Decimal,
    pub sold_at: DateTime<Utc>,
}

/// A historical sale as the store keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSale {
    #[serde(alias = "card_id")]
    pub item_id: String,
    pub grade: String,
    pub grading_company: String,
    #[serde(alias = "price")]
    pub sale_price: Decimal,
    pub sold_at: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
}

impl StoredSale {
    pub fn record(&self) -> SaleRecord {
        SaleRecord {
            sale_price: self.sale_price,
            sold_at: self.sold_at,
        }
    }
}

/// A listing currently for sale, with the last analysis written back onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveListing {
    #[serde(alias = "card_id")]
    pub item_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(alias = "listing_price")]
    pub asking_price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub grade: Option<String>,
    pub grading_company: Option<String>,
    #[serde(default)]
    pub comp_value: Option<Decimal>,
    #[serde(default)]
    pub is_undervalued: bool,
}

impl ActiveListing {
    pub fn query(&self) -> ListingQuery {
        ListingQuery {
            item_id: Some(self.item_id.clone()),
            grade: self.grade.clone(),
            grading_company: self.grading_company.clone(),
            asking_price: Some(self.asking_price),
            currency: self.currency.clone(),
        }
    }
}

/// Summary of a comparable window. All fields are `None` when `count` is 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompStats {
    pub count: usize,
    pub median: Option<Decimal>,
    pub mean: Option<Decimal>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Which step of the pipeline produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Invalid,
    RawSkipped,
    Blacklisted,
    RetrievalFailed,
    NoComps,
    LowVolume,
    SufficientComps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub is_undervalued: bool,
    pub message: String,
    pub stats: CompStats,
    pub threshold_used: Decimal,
    pub window_days: u32,
}
