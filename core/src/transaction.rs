//! Candidate transaction records and their wire-level representations.
//!
//! The source store keeps timestamps as ISO-8601 UTC text (`...T..:..:..Z`)
//! and amounts as integer minor units. Both conversions live here so the
//! store layer and the clusterer agree on one parsing rule.

use crate::error::{DetectError, DetectResult};
use crate::types::{AccountId, MinorAmount, TxId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flow direction of a cash transaction, as stored in
/// `cash_transactions.direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// One candidate transaction. Read-only input to the clusterer; the source
/// store owns these rows.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub tx_id: TxId,
    pub account_id: AccountId,
    pub customer_id: Option<String>,
    pub ts: DateTime<Utc>,
    pub amount_minor: MinorAmount,
}

/// Parse a `ts_utc` column value. Accepts RFC 3339 (`2024-03-01T09:00:00Z`)
/// and the bare naive form some generators emit, with or without fractional
/// seconds. Anything else is a fatal input error.
pub fn parse_ts_utc(value: &str) -> DetectResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|n| n.and_utc())
        .map_err(|_| DetectError::Timestamp {
            value: value.to_string(),
        })
}

/// Format a timestamp back into the store's wire form, seconds precision.
pub fn format_ts_utc(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
