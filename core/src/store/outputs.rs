//! Detection outputs — the write side of the pipeline.
//!
//! All writes for one run happen inside a single transaction: either every
//! cluster, link, and alert row lands, or none do. Duplicate primary keys
//! are skipped, not raised (INSERT OR IGNORE at the store boundary).

use super::DetectStore;
use crate::cluster::Cluster;
use crate::config::{DetectionConfig, OutputTables};
use crate::detector::RunSummary;
use crate::error::DetectResult;
use crate::transaction::format_ts_utc;
use crate::types::MinorAmount;
use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

/// Bounded linear severity: how many threshold-units of turnover flowed
/// through the cluster, clamped to `[0, 100]`, two decimals.
pub fn structuring_score(total_minor: MinorAmount, per_tx_threshold_minor: MinorAmount) -> f64 {
    let raw = total_minor as f64 / per_tx_threshold_minor.max(1) as f64;
    (raw.min(100.0) * 100.0).round() / 100.0
}

/// One persisted cluster row, read back as stored.
#[derive(Debug, Clone)]
pub struct ClusterRow {
    pub cluster_id: String,
    pub account_id: String,
    pub customer_id: Option<String>,
    pub start_ts_utc: String,
    pub end_ts_utc: String,
    pub tx_count: i64,
    pub total_amount_minor: i64,
    pub params_json: String,
}

/// One row of the external `alerts` relation, read back as stored.
#[derive(Debug, Clone)]
pub struct AlertRow {
    pub alert_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub rule_id: String,
    pub score: f64,
    pub typology: Option<String>,
    pub outcome: String,
}

impl DetectStore {
    /// Write every finalized cluster, its membership links, and (when
    /// enabled) one account-level alert per cluster with its own links.
    /// One atomic unit: any failure rolls the whole run back.
    pub fn persist_detection(
        &mut self,
        clusters: &[Cluster],
        cfg: &DetectionConfig,
    ) -> DetectResult<RunSummary> {
        let params_json = serde_json::to_string(&cfg.params)?;
        let created_ts = format_ts_utc(Utc::now());
        let txn = self.conn.transaction()?;

        let mut summary = RunSummary::default();
        for cluster in clusters {
            txn.execute(
                &format!(
                    "INSERT OR IGNORE INTO {}
                     (cluster_id, account_id, customer_id, start_ts_utc, end_ts_utc,
                      tx_count, total_amount_minor, params_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    cfg.tables.clusters
                ),
                params![
                    cluster.cluster_id,
                    cluster.account_id,
                    cluster.customer_id,
                    format_ts_utc(cluster.start_ts),
                    format_ts_utc(cluster.end_ts),
                    cluster.tx_count() as i64,
                    cluster.total_minor(),
                    params_json,
                ],
            )?;
            summary.clusters += 1;

            for tx_id in cluster.members.keys() {
                txn.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {} (cluster_id, tx_id) VALUES (?1, ?2)",
                        cfg.tables.cluster_tx
                    ),
                    params![cluster.cluster_id, tx_id],
                )?;
                summary.links += 1;
            }

            if cfg.write_alerts {
                let alert_id = Uuid::new_v4().to_string();
                let score =
                    structuring_score(cluster.total_minor(), cfg.params.per_tx_threshold_minor);
                txn.execute(
                    "INSERT INTO alerts
                     (alert_id, created_ts_utc, entity_type, entity_id, rule_id,
                      score, label, typology, outcome, closed_ts_utc)
                     VALUES (?1, ?2, 'ACCOUNT', ?3, 'R_STRUCTURING_01',
                             ?4, NULL, 'STRUCTURING', 'OPEN', NULL)",
                    params![alert_id, created_ts, cluster.account_id, score],
                )?;
                summary.alerts += 1;

                for tx_id in cluster.members.keys() {
                    txn.execute(
                        &format!(
                            "INSERT OR IGNORE INTO {} (alert_id, tx_id) VALUES (?1, ?2)",
                            cfg.tables.alert_tx
                        ),
                        params![alert_id, tx_id],
                    )?;
                }
            }
        }

        txn.commit()?;
        Ok(summary)
    }

    // ── Read-back queries (tests and reporting) ──────────────────────────

    pub fn fetch_clusters(&self, tables: &OutputTables) -> DetectResult<Vec<ClusterRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT cluster_id, account_id, customer_id, start_ts_utc, end_ts_utc,
                    tx_count, total_amount_minor, params_json
             FROM {}
             ORDER BY account_id, start_ts_utc",
            tables.clusters
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(ClusterRow {
                cluster_id: row.get(0)?,
                account_id: row.get(1)?,
                customer_id: row.get(2)?,
                start_ts_utc: row.get(3)?,
                end_ts_utc: row.get(4)?,
                tx_count: row.get(5)?,
                total_amount_minor: row.get(6)?,
                params_json: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Member transaction ids linked to one cluster, sorted.
    pub fn fetch_cluster_links(
        &self,
        tables: &OutputTables,
        cluster_id: &str,
    ) -> DetectResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT tx_id FROM {} WHERE cluster_id = ?1 ORDER BY tx_id",
            tables.cluster_tx
        ))?;
        let rows = stmt.query_map(params![cluster_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn fetch_alerts(&self) -> DetectResult<Vec<AlertRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT alert_id, entity_type, entity_id, rule_id, score, typology, outcome
             FROM alerts
             ORDER BY entity_id, alert_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AlertRow {
                alert_id: row.get(0)?,
                entity_type: row.get(1)?,
                entity_id: row.get(2)?,
                rule_id: row.get(3)?,
                score: row.get(4)?,
                typology: row.get(5)?,
                outcome: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Member transaction ids linked to one alert, sorted.
    pub fn fetch_alert_links(
        &self,
        tables: &OutputTables,
        alert_id: &str,
    ) -> DetectResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT tx_id FROM {} WHERE alert_id = ?1 ORDER BY tx_id",
            tables.alert_tx
        ))?;
        let rows = stmt.query_map(params![alert_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
