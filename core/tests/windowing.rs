//! Pure clusterer tests: window semantics, running-sum accuracy, and the
//! cluster merge state machine. No database involved.

use chrono::{DateTime, Duration, TimeZone, Utc};
use smurf_core::cluster::clusters_for_account;
use smurf_core::config::DetectionParams;
use smurf_core::transaction::Transaction;
use smurf_core::window::WindowState;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn tx_at(id: &str, days: i64, amount_minor: i64) -> Transaction {
    Transaction {
        tx_id: id.into(),
        account_id: "ACC-1".into(),
        customer_id: Some("CUST-1".into()),
        ts: base() + Duration::days(days),
        amount_minor,
    }
}

fn params(window_days: i64, min_count: usize, min_total_minor: i64) -> DetectionParams {
    DetectionParams {
        window_days,
        min_count,
        min_total_minor,
        ..DetectionParams::default()
    }
}

fn run(txs: &[Transaction], p: &DetectionParams) -> Vec<smurf_core::cluster::Cluster> {
    clusters_for_account("ACC-1", Some("CUST-1"), txs, p)
}

/// Three sub-threshold deposits inside two days trip both thresholds once.
#[test]
fn three_deposits_in_two_days_form_one_cluster() {
    let txs = vec![
        tx_at("T-1", 0, 900_000),
        tx_at("T-2", 1, 900_000),
        tx_at("T-3", 2, 900_000),
    ];
    let clusters = run(&txs, &params(10, 3, 2_000_000));

    assert_eq!(clusters.len(), 1, "expected exactly one cluster");
    let c = &clusters[0];
    assert_eq!(c.tx_count(), 3);
    assert_eq!(c.total_minor(), 2_700_000);
    assert_eq!(c.start_ts, base());
    assert_eq!(c.end_ts, base() + Duration::days(2));
}

/// The same three deposits spread fifteen days apart never share a window.
#[test]
fn deposits_spread_past_the_window_never_match() {
    let txs = vec![
        tx_at("T-1", 0, 900_000),
        tx_at("T-2", 15, 900_000),
        tx_at("T-3", 30, 900_000),
    ];
    let clusters = run(&txs, &params(10, 3, 2_000_000));
    assert!(clusters.is_empty(), "got {} clusters", clusters.len());
}

/// A continuous spree triggers a match on every trailing transaction; all of
/// them merge into one cluster spanning the full episode, with the total
/// recomputed from the member union.
#[test]
fn overlapping_matches_merge_into_one_cluster() {
    let txs: Vec<_> = (0..5)
        .map(|i| tx_at(&format!("T-{i}"), i, 500_000))
        .collect();
    let clusters = run(&txs, &params(10, 3, 1_200_000));

    assert_eq!(clusters.len(), 1, "overlapping matches must merge");
    let c = &clusters[0];
    assert_eq!(c.tx_count(), 5);
    assert_eq!(c.total_minor(), 2_500_000);
    assert_eq!(c.start_ts, base());
    assert_eq!(c.end_ts, base() + Duration::days(4));
}

/// Windows that share most of their members still count each transaction
/// exactly once after the merge.
#[test]
fn merged_cluster_never_double_counts() {
    let txs: Vec<_> = (0..6)
        .map(|i| tx_at(&format!("T-{i}"), i, 700_000))
        .collect();
    let clusters = run(&txs, &params(2, 2, 1_000_000));

    assert_eq!(clusters.len(), 1);
    let c = &clusters[0];
    assert_eq!(c.tx_count(), c.members.len());
    assert_eq!(c.tx_count(), 6);
    assert_eq!(c.total_minor(), 4_200_000);
}

/// Episodes whose windows never touch finalize as distinct, non-overlapping
/// clusters.
#[test]
fn separate_episodes_finalize_as_distinct_clusters() {
    let txs = vec![
        tx_at("T-1", 0, 600_000),
        tx_at("T-2", 1, 600_000),
        tx_at("T-3", 10, 600_000),
        tx_at("T-4", 11, 600_000),
    ];
    let clusters = run(&txs, &params(2, 2, 1_000_000));

    assert_eq!(clusters.len(), 2, "expected two separate episodes");
    let (a, b) = (&clusters[0], &clusters[1]);
    assert_eq!(a.tx_count(), 2);
    assert_eq!(b.tx_count(), 2);
    assert!(
        b.start_ts > a.end_ts,
        "consecutive clusters must not overlap: {} <= {}",
        b.start_ts,
        a.end_ts
    );
}

/// A transaction at exactly `window_days` of age stays in the window; one
/// second past it is evicted.
#[test]
fn boundary_transaction_at_exact_window_age_is_retained() {
    let p = params(10, 2, 1_000_000);

    let on_boundary = vec![tx_at("T-1", 0, 600_000), tx_at("T-2", 10, 600_000)];
    let clusters = run(&on_boundary, &p);
    assert_eq!(clusters.len(), 1, "boundary member should still qualify");
    assert_eq!(clusters[0].tx_count(), 2);

    let past_boundary = vec![
        tx_at("T-1", 0, 600_000),
        Transaction {
            ts: base() + Duration::days(10) + Duration::seconds(1),
            ..tx_at("T-2", 0, 600_000)
        },
    ];
    let clusters = run(&past_boundary, &p);
    assert!(clusters.is_empty(), "evicted member must not qualify");
}

/// The running sum equals the exact sum of queued amounts after any number of
/// append/evict cycles, and no window ever spans more than `window_days`.
#[test]
fn running_sum_never_drifts() {
    let days = [0i64, 1, 3, 10, 11, 12, 13, 30, 31, 60];
    let mut win = WindowState::new(10);

    for (i, day) in days.iter().enumerate() {
        win.push(tx_at(&format!("T-{i}"), *day, 100_000 + i as i64 * 7_331));
        let snapshot = win.snapshot().expect("window is never empty after push");

        let exact: i64 = snapshot.members.iter().map(|(_, amt)| amt).sum();
        assert_eq!(win.total_minor(), exact, "sum drifted at push {i}");
        assert!(
            snapshot.window_end - snapshot.window_start <= Duration::days(10),
            "window span exceeded the bound at push {i}"
        );
    }
}

/// Running the clusterer twice on the same input yields identical membership
/// and boundaries. Only the freshly generated ids differ.
#[test]
fn merge_is_idempotent_across_runs() {
    let txs: Vec<_> = (0..5)
        .map(|i| tx_at(&format!("T-{i}"), i, 500_000))
        .collect();
    let p = params(10, 3, 1_200_000);

    let first = run(&txs, &p);
    let second = run(&txs, &p);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.start_ts, b.start_ts);
        assert_eq!(a.end_ts, b.end_ts);
        assert_eq!(a.members, b.members);
        assert_ne!(a.cluster_id, b.cluster_id, "ids are freshly generated");
    }
}

/// Timestamp ties are processed in input order and all land in the cluster.
#[test]
fn timestamp_ties_keep_input_order() {
    let txs = vec![
        tx_at("T-1", 0, 900_000),
        tx_at("T-2", 0, 900_000),
        tx_at("T-3", 0, 900_000),
    ];
    let clusters = run(&txs, &params(10, 3, 2_000_000));

    assert_eq!(clusters.len(), 1);
    let c = &clusters[0];
    assert_eq!(c.tx_count(), 3);
    assert_eq!(c.start_ts, c.end_ts);
}

/// Fewer qualifying transactions than `min_count` can never match.
#[test]
fn fewer_than_min_count_produces_nothing() {
    let txs = vec![tx_at("T-1", 0, 900_000), tx_at("T-2", 1, 900_000)];
    let clusters = run(&txs, &params(10, 3, 1_000_000));
    assert!(clusters.is_empty());
}
