//! One detection run: load candidates, cluster each account independently,
//! persist everything in a single atomic unit.

use crate::cluster::{clusters_for_account, Cluster};
use crate::config::DetectionConfig;
use crate::error::DetectResult;
use crate::store::DetectStore;
use crate::transaction::Transaction;
use crate::types::AccountId;
use std::collections::BTreeMap;

/// Counts reported back from one run. Reporting only; correctness never
/// depends on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub clusters: usize,
    pub links: usize,
    pub alerts: usize,
}

/// Partition loader output into per-account ordered sequences. The input is
/// already sorted by `(account_id, ts_utc)`; order inside each partition is
/// preserved untouched, including timestamp ties.
pub fn group_by_account(txs: Vec<Transaction>) -> BTreeMap<AccountId, Vec<Transaction>> {
    let mut by_account: BTreeMap<AccountId, Vec<Transaction>> = BTreeMap::new();
    for tx in txs {
        by_account.entry(tx.account_id.clone()).or_default().push(tx);
    }
    by_account
}

/// Run the full detection pipeline against `store`.
///
/// Precondition: `cfg` has passed [`DetectionConfig::validate`].
pub fn run_detection(store: &mut DetectStore, cfg: &DetectionConfig) -> DetectResult<RunSummary> {
    store.ensure_output_tables(&cfg.tables)?;

    let candidates = store.load_candidates(&cfg.params)?;
    log::info!("loaded {} candidate transactions", candidates.len());

    let mut clusters: Vec<Cluster> = Vec::new();
    for (account_id, txs) in group_by_account(candidates) {
        let customer_id = txs.first().and_then(|t| t.customer_id.as_deref());
        let found = clusters_for_account(&account_id, customer_id, &txs, &cfg.params);
        if !found.is_empty() {
            log::warn!(
                "account {}: {} structuring cluster(s)",
                account_id,
                found.len()
            );
        }
        clusters.extend(found);
    }

    let summary = store.persist_detection(&clusters, cfg)?;
    log::info!(
        "run complete: {} clusters, {} links, {} alerts",
        summary.clusters,
        summary.links,
        summary.alerts
    );
    Ok(summary)
}
