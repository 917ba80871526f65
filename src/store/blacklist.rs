use std::path::PathBuf;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::valuation::Blacklist;

// Ids are written as bare numbers as often as strings in hand-kept lists.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(i64),
        Str(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    #[serde(alias = "card_id", deserialize_with = "id_string")]
    pub item_id: String,
    #[serde(default)]
    pub grade: Option<String>,
}

impl BlacklistEntry {
    pub fn matches(&self, item_id: &str, grade: &str) -> bool {
        self.item_id == item_id
            && self.grade.as_deref().unwrap_or("").trim().to_lowercase() == grade.trim().to_lowercase()
    }
}

impl Blacklist for Vec<BlacklistEntry> {
    fn is_blacklisted(&self, item_id: &str, grade: &str) -> bool {
        self.iter().any(|e| e.matches(item_id, grade))
    }
}

/// Blacklist kept in a YAML file, re-read on every lookup so edits apply immediately.
pub struct YamlBlacklist {
    path: PathBuf,
}

impl YamlBlacklist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<BlacklistEntry>, ValuationError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| ValuationError::Blacklist(format!("read {}: {}", self.path.display(), e)))?;
        if raw.trim().is_empty() {
            return Ok(vec![]);
        }
        let entries: Option<Vec<BlacklistEntry>> = serde_yaml::from_str(&raw)
            .map_err(|e| ValuationError::Blacklist(format!("parse {}: {}", self.path.display(), e)))?;
        Ok(entries.unwrap_or_default())
    }
}

impl Blacklist for YamlBlacklist {
    fn is_blacklisted(&self, item_id: &str, grade: &str) -> bool {
        match self.load() {
            Ok(entries) => entries.is_blacklisted(item_id, grade),
            Err(e) => {
                // fail open
                tracing::warn!(error = %e, "treating blacklist as empty");
                false
            }
        }
    }
}
