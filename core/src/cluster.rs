//! Cluster construction: overlapping qualifying windows collapse into one
//! finalized cluster per structuring episode.
//!
//! A spree of sub-threshold deposits triggers a window match on almost every
//! transaction; without the merge pass the same campaign would surface as
//! dozens of near-duplicate clusters. Merging is driven by a two-state
//! machine so the finalize-at-end-of-sequence case cannot be missed.

use crate::config::DetectionParams;
use crate::transaction::Transaction;
use crate::types::{AccountId, MinorAmount, TxId};
use crate::window::{WindowMatch, WindowState};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A finalized structuring cluster for one account.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub cluster_id: String,
    pub account_id: AccountId,
    pub customer_id: Option<String>,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    /// Member transactions, `tx_id → amount_minor`. The union over every
    /// merged window; count and total both derive from here, so a transaction
    /// shared by several windows is never double-counted.
    pub members: BTreeMap<TxId, MinorAmount>,
}

impl Cluster {
    pub fn tx_count(&self) -> usize {
        self.members.len()
    }

    pub fn total_minor(&self) -> MinorAmount {
        self.members.values().sum()
    }

    fn open(account_id: &str, customer_id: Option<&str>, m: WindowMatch) -> Self {
        Self {
            cluster_id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            customer_id: customer_id.map(str::to_string),
            start_ts: m.window_start,
            end_ts: m.window_end,
            members: m.members.into_iter().collect(),
        }
    }

    /// Extend the open cluster with an overlapping window match.
    fn absorb(&mut self, m: WindowMatch) {
        self.end_ts = m.window_end;
        self.members.extend(m.members);
    }
}

/// Merge pass state: at most one open cluster per account at a time.
enum MergeState {
    Idle,
    Open(Cluster),
}

/// Scan one account's time-ordered transactions, emit a window match whenever
/// both thresholds are met, and merge overlapping matches into finalized
/// clusters.
///
/// A match merges into the open cluster iff `window_start <= open.end_ts`;
/// adjacency (equality) merges. Episodes whose windows never touch finalize
/// separately.
pub fn clusters_for_account(
    account_id: &str,
    customer_id: Option<&str>,
    txs: &[Transaction],
    params: &DetectionParams,
) -> Vec<Cluster> {
    let mut win = WindowState::new(params.window_days);
    let mut state = MergeState::Idle;
    let mut out = Vec::new();

    for tx in txs {
        win.push(tx.clone());
        if win.len() < params.min_count || win.total_minor() < params.min_total_minor {
            continue;
        }
        let Some(m) = win.snapshot() else { continue };
        state = match state {
            MergeState::Open(mut open) if m.window_start <= open.end_ts => {
                open.absorb(m);
                MergeState::Open(open)
            }
            MergeState::Open(done) => {
                out.push(done);
                MergeState::Open(Cluster::open(account_id, customer_id, m))
            }
            MergeState::Idle => MergeState::Open(Cluster::open(account_id, customer_id, m)),
        };
    }

    if let MergeState::Open(done) = state {
        out.push(done);
    }
    out
}
