use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ValuationError;
use crate::types::{ActiveListing, SaleRecord, StoredSale};
use crate::valuation::{ListingSink, SalesHistory};

/// Sales history and active listings held in memory, loaded from JSON snapshots.
pub struct MemoryStore {
    sales: Vec<StoredSale>,
    listings: Mutex<Vec<ActiveListing>>,
}

impl MemoryStore {
    pub fn new(listings: Vec<ActiveListing>, sales: Vec<StoredSale>) -> Self {
        Self {
            sales,
            listings: Mutex::new(listings),
        }
    }

    pub async fn load(listings_path: &str, sales_path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(listings_path)
            .await
            .with_context(|| format!("read listings {}", listings_path))?;
        let listings: Vec<ActiveListing> =
            serde_json::from_str(&raw).with_context(|| format!("decode listings {}", listings_path))?;

        let raw = tokio::fs::read_to_string(sales_path)
            .await
            .with_context(|| format!("read sales {}", sales_path))?;
        let sales: Vec<StoredSale> =
            serde_json::from_str(&raw).with_context(|| format!("decode sales {}", sales_path))?;

        tracing::info!(listings = listings.len(), sales = sales.len(), "store loaded");
        Ok(Self::new(listings, sales))
    }

    pub async fn save_listings(&self, path: &str) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.active_listings())?;
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("write listings {}", path))?;
        Ok(())
    }

    pub fn active_listings(&self) -> Vec<ActiveListing> {
        self.listings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SalesHistory for MemoryStore {
    fn fetch(
        &self,
        item_id: &str,
        grade: &str,
        grading_company: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, ValuationError> {
        Ok(self
            .sales
            .iter()
            .filter(|s| {
                s.item_id == item_id
                    && s.grade == grade
                    && s.grading_company == grading_company
                    && s.sold_at >= since
            })
            .map(StoredSale::record)
            .collect())
    }
}

impl ListingSink for MemoryStore {
    fn update_comp_value(
        &self,
        item_id: &str,
        median: Option<Decimal>,
        is_undervalued: bool,
    ) -> Result<(), ValuationError> {
        let mut listings = self
            .listings
            .lock()
            .map_err(|_| ValuationError::Persistence("listing store lock poisoned".into()))?;
        if let Some(l) = listings.iter_mut().find(|l| l.item_id == item_id) {
            l.comp_value = median;
            l.is_undervalued = is_undervalued;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sale(item: &str, grade: &str, company: &str, price: Decimal, days_ago: i64) -> StoredSale {
        StoredSale {
            item_id: item.into(),
            grade: grade.into(),
            grading_company: company.into(),
            sale_price: price,
            sold_at: Utc::now() - Duration::days(days_ago),
            source: Some("eBay".into()),
        }
    }

    fn listing(item: &str, price: Decimal) -> ActiveListing {
        ActiveListing {
            item_id: item.into(),
            title: "1989 Upper Deck Ken Griffey Jr. #1".into(),
            source: "eBay".into(),
            source_url: "http://example.com/listing".into(),
            asking_price: price,
            currency: "USD".into(),
            grade: Some("PSA 9".into()),
            grading_company: Some("PSA".into()),
            comp_value: None,
            is_undervalued: false,
        }
    }

    #[test]
    fn fetch_matches_exact_key_and_window() {
        let store = MemoryStore::new(
            vec![],
            vec![
                sale("1", "PSA 9", "PSA", dec!(100), 5),
                sale("1", "PSA 9", "PSA", dec!(110), 200),
                sale("1", "PSA 10", "PSA", dec!(300), 5),
                sale("1", "PSA 9", "BGS", dec!(90), 5),
                sale("2", "PSA 9", "PSA", dec!(50), 5),
            ],
        );
        let got = store
            .fetch("1", "PSA 9", "PSA", Utc::now() - Duration::days(90))
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].sale_price, dec!(100));
    }

    #[test]
    fn write_back_updates_first_matching_listing() {
        let store = MemoryStore::new(vec![listing("1", dec!(10)), listing("1", dec!(20))], vec![]);
        store.update_comp_value("1", Some(dec!(1575)), true).unwrap();
        store.update_comp_value("missing", Some(dec!(1)), true).unwrap();

        let l = store.active_listings();
        assert_eq!(l[0].comp_value, Some(dec!(1575)));
        assert!(l[0].is_undervalued);
        assert_eq!(l[1].comp_value, None);
    }

    #[tokio::test]
    async fn load_and_save_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let listings_path = dir.path().join("listings.json");
        let sales_path = dir.path().join("sales.json");
        std::fs::write(
            &listings_path,
            r#"[{"card_id": "1", "listing_price": 1300.0, "grade": "PSA 9", "grading_company": "PSA",
                 "source": "eBay", "source_url": "http://example.com/listing1"}]"#,
        )
        .unwrap();
        std::fs::write(
            &sales_path,
            r#"[{"card_id": "1", "grade": "PSA 9", "grading_company": "PSA", "price": "1500",
                 "sold_at": "2025-05-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let store = MemoryStore::load(listings_path.to_str().unwrap(), sales_path.to_str().unwrap())
            .await
            .unwrap();
        let l = store.active_listings();
        assert_eq!(l.len(), 1);
        assert_eq!(l[0].asking_price, dec!(1300));
        assert_eq!(l[0].currency, "USD");

        store.update_comp_value("1", Some(dec!(1500)), true).unwrap();
        let out = dir.path().join("out").join("listings.json");
        store.save_listings(out.to_str().unwrap()).await.unwrap();

        let saved: Vec<ActiveListing> =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved[0].comp_value, Some(dec!(1500)));
        assert!(saved[0].is_undervalued);
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = MemoryStore::load("/nonexistent/l.json", "/nonexistent/s.json")
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("read listings"));
    }
}
