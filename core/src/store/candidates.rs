//! Candidate loading — the read side of the pipeline.

use super::DetectStore;
use crate::config::DetectionParams;
use crate::error::DetectResult;
use crate::transaction::{parse_ts_utc, Transaction};
use crate::types::MinorAmount;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

impl DetectStore {
    /// Fetch every transaction that could participate in a structuring
    /// pattern: channel in the configured set, matching direction, amount
    /// strictly under the per-transaction ceiling, joined against a valid
    /// account. Ordered by `(account_id, ts_utc)`; timestamp ties keep the
    /// store's row order.
    pub fn load_candidates(&self, p: &DetectionParams) -> DetectResult<Vec<Transaction>> {
        let placeholders = vec!["?"; p.channels.len()].join(",");
        let sql = format!(
            "SELECT t.tx_id, t.account_id, t.customer_id, t.ts_utc, t.amount_minor
             FROM cash_transactions t
             JOIN accounts a ON a.account_id = t.account_id
             WHERE t.channel IN ({placeholders})
               AND t.direction = ?
               AND t.amount_minor < ?
             ORDER BY t.account_id, t.ts_utc"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let mut bind: Vec<Value> = p
            .channels
            .iter()
            .map(|c| Value::from(c.clone()))
            .collect();
        bind.push(Value::from(p.direction.as_str().to_string()));
        bind.push(Value::from(p.per_tx_threshold_minor));

        let rows = stmt.query_map(params_from_iter(bind), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (tx_id, account_id, customer_id, ts_utc, amount_minor) = row?;
            out.push(Transaction {
                tx_id,
                account_id,
                customer_id,
                ts: parse_ts_utc(&ts_utc)?,
                amount_minor,
            });
        }
        Ok(out)
    }

    // ── Fixtures ─────────────────────────────────────────────────────────
    // The production source rows are written by the upstream generator;
    // these inserts exist for integration tests and synthetic datasets.

    pub fn insert_account(&self, account_id: &str, customer_id: Option<&str>) -> DetectResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO accounts (account_id, customer_id) VALUES (?1, ?2)",
            params![account_id, customer_id],
        )?;
        Ok(())
    }

    pub fn insert_cash_transaction(
        &self,
        tx_id: &str,
        account_id: &str,
        customer_id: Option<&str>,
        ts_utc: &str,
        amount_minor: MinorAmount,
        channel: &str,
        direction: &str,
    ) -> DetectResult<()> {
        self.conn.execute(
            "INSERT INTO cash_transactions
             (tx_id, account_id, customer_id, ts_utc, amount_minor, channel, direction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tx_id,
                account_id,
                customer_id,
                ts_utc,
                amount_minor,
                channel,
                direction
            ],
        )?;
        Ok(())
    }
}
