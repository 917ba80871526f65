use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use card_comps::batch::evaluate_active;
use card_comps::stats::RunStats;
use card_comps::store::{MemoryStore, YamlBlacklist};
use card_comps::{Settings, Valuator, Verdict};

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

async fn maybe_write_jsonl(path: &Option<String>, lines: &[String]) {
    if let Some(p) = path.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()) {
        match tokio::fs::OpenOptions::new().create(true).append(true).open(&p).await {
            Ok(mut f) => {
                use tokio::io::AsyncWriteExt;
                for line in lines {
                    if let Err(e) = f.write_all(format!("{}\n", line).as_bytes()).await {
                        tracing::warn!(path = %p, error = %e, "jsonl write failed");
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(path = %p, error = %e, "jsonl open failed"),
        }
    }
}

#[derive(Serialize)]
struct VerdictLine<'a> {
    run_id: Uuid,
    item_id: &'a str,
    source_url: &'a str,
    #[serde(flatten)]
    verdict: &'a Verdict,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let s = Settings::from_env()?;
    let cfg = s.valuator_config()?;
    let run_id = Uuid::new_v4();
    tracing::info!(
        %run_id,
        window_days = cfg.history_window_days,
        base_threshold = %cfg.base_threshold,
        dynamic = cfg.use_dynamic_threshold,
        "starting valuation run"
    );

    let store = Arc::new(MemoryStore::load(&s.listings_path, &s.sales_path).await?);
    let blacklist = Arc::new(YamlBlacklist::new(&s.blacklist_path));
    let mut valuator = Valuator::new(store.clone(), blacklist);
    if s.write_back {
        valuator = valuator.with_sink(store.clone());
    }

    let stats = RunStats::new(now_ms());
    let items = evaluate_active(&valuator, store.active_listings(), &cfg, &stats);

    let mut lines: Vec<String> = items
        .iter()
        .filter_map(|i| {
            serde_json::to_string(&VerdictLine {
                run_id,
                item_id: &i.listing.item_id,
                source_url: &i.listing.source_url,
                verdict: &i.verdict,
            })
            .ok()
        })
        .collect();

    let ss = stats.snapshot(now_ms());
    tracing::info!(
        %run_id,
        evaluated = ss.evaluated,
        deals = ss.deals,
        raw_skipped = ss.raw_skipped,
        blacklisted = ss.blacklisted,
        no_comps = ss.no_comps,
        low_volume = ss.low_volume,
        invalid = ss.invalid,
        retrieval_failed = ss.retrieval_failed,
        "stats"
    );
    lines.push(serde_json::to_string(&ss).unwrap_or_default());
    maybe_write_jsonl(&s.verdicts_jsonl_path, &lines).await;

    if s.write_back {
        store.save_listings(&s.listings_path).await?;
    }
    Ok(())
}
