//! Shared primitive types used across the detector.

/// A stable transaction identifier from the source store.
pub type TxId = String;

/// A stable account identifier from the source store.
pub type AccountId = String;

/// An integer currency amount in minor units (cents).
pub type MinorAmount = i64;
