//! Trailing time window over one account's transaction sequence.
//!
//! The queue is ordered by timestamp ascending; the loader already sorts, and
//! ties keep loader order. The running sum always equals the exact sum of the
//! queued amounts: every push adds once, every eviction subtracts once.

use crate::transaction::Transaction;
use crate::types::{MinorAmount, TxId};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// One qualifying window observation: the full queue state at the moment the
/// count and total thresholds were both met.
#[derive(Debug, Clone)]
pub struct WindowMatch {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// `(tx_id, amount_minor)` for every queue member, oldest first.
    pub members: Vec<(TxId, MinorAmount)>,
}

/// Sliding queue of transactions inside the trailing window, with a running
/// amount sum. Push transactions in timestamp order only.
#[derive(Debug)]
pub struct WindowState {
    queue: VecDeque<Transaction>,
    total_minor: MinorAmount,
    span: Duration,
}

impl WindowState {
    pub fn new(window_days: i64) -> Self {
        Self {
            queue: VecDeque::new(),
            total_minor: 0,
            span: Duration::days(window_days),
        }
    }

    /// Append the next transaction, then evict from the front everything that
    /// fell out of the trailing window. A boundary transaction at exactly
    /// `window_days` of age is retained.
    pub fn push(&mut self, tx: Transaction) {
        let cutoff = tx.ts - self.span;
        self.total_minor += tx.amount_minor;
        self.queue.push_back(tx);
        while let Some(front) = self.queue.front() {
            if front.ts >= cutoff {
                break;
            }
            let evicted_amount = front.amount_minor;
            self.queue.pop_front();
            self.total_minor -= evicted_amount;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn total_minor(&self) -> MinorAmount {
        self.total_minor
    }

    /// Snapshot the current queue as a window match. `None` on an empty
    /// window.
    pub fn snapshot(&self) -> Option<WindowMatch> {
        let oldest = self.queue.front()?;
        let newest = self.queue.back()?;
        Some(WindowMatch {
            window_start: oldest.ts,
            window_end: newest.ts,
            members: self
                .queue
                .iter()
                .map(|t| (t.tx_id.clone(), t.amount_minor))
                .collect(),
        })
    }
}
