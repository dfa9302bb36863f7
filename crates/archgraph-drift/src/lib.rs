//! Drift detection: where the structural model and the diagrams disagree.
//!
//! Errors and warnings are returned as data in a [`DriftReport`]; deciding
//! whether drift fails a run is left to the caller (see
//! [`DriftReport::is_failure`]).

pub mod detector;
pub mod report;

pub use detector::{detect_drift, DriftDetector};
pub use report::{DriftIssue, DriftKind, DriftReport, Severity};
