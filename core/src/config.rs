//! Detection run configuration.
//!
//! Validated once by the caller (`DetectionConfig::validate`) before a run
//! starts; the clusterer and store treat a valid configuration as a
//! precondition and do not re-check it.

use crate::error::{DetectError, DetectResult};
use crate::transaction::Direction;
use crate::types::MinorAmount;
use serde::{Deserialize, Serialize};

/// Frozen detection parameters for one run. Serialized verbatim into
/// `params_json` on every cluster row, so a cluster can always be traced back
/// to the thresholds that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Channels to consider, upper-cased (`CASH`, `ATM`, ...).
    pub channels: Vec<String>,
    pub direction: Direction,
    /// Per-transaction ceiling. Transactions at or above it are excluded
    /// from consideration.
    pub per_tx_threshold_minor: MinorAmount,
    pub window_days: i64,
    /// Minimum queue size for a window to qualify.
    pub min_count: usize,
    /// Minimum running total for a window to qualify.
    pub min_total_minor: MinorAmount,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            channels: vec!["CASH".into(), "ATM".into()],
            direction: Direction::In,
            per_tx_threshold_minor: 1_000_000, // 10000.00 major
            window_days: 10,
            min_count: 3,
            min_total_minor: 2_000_000, // 20000.00 major
        }
    }
}

/// Output relation names. The schema of each is a fixed external contract;
/// only the names are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTables {
    pub clusters: String,
    pub cluster_tx: String,
    pub alert_tx: String,
}

impl Default for OutputTables {
    fn default() -> Self {
        Self {
            clusters: "smurf_clusters".into(),
            cluster_tx: "smurf_cluster_tx".into(),
            alert_tx: "smurf_alert_tx".into(),
        }
    }
}

/// Full configuration surface for one detection run.
#[derive(Debug, Clone, Default)]
pub struct DetectionConfig {
    pub params: DetectionParams,
    /// Also append one account-level alert per cluster to the external
    /// `alerts` relation.
    pub write_alerts: bool,
    pub tables: OutputTables,
}

impl DetectionConfig {
    /// Reject configurations the detection core is allowed to assume away.
    pub fn validate(&self) -> DetectResult<()> {
        let p = &self.params;
        if p.channels.is_empty() {
            return Err(DetectError::InvalidConfig("channel set is empty".into()));
        }
        if p.per_tx_threshold_minor <= 0 {
            return Err(DetectError::InvalidConfig(
                "per-transaction threshold must be positive".into(),
            ));
        }
        if p.window_days <= 0 {
            return Err(DetectError::InvalidConfig(
                "window size must be a positive number of days".into(),
            ));
        }
        if p.min_count == 0 {
            return Err(DetectError::InvalidConfig(
                "minimum transaction count must be positive".into(),
            ));
        }
        if p.min_total_minor <= 0 {
            return Err(DetectError::InvalidConfig(
                "minimum window total must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Convert a major-unit amount (as entered on the command line) to minor
/// units, rounding to the nearest cent.
pub fn major_to_minor(major: f64) -> MinorAmount {
    (major * 100.0).round() as MinorAmount
}
