#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Result reconciliation for cscan
//!
//! Raw result payloads are normalized here and nowhere else. The remaining
//! operations are pure functions over the canonical [`ScanResult`]: severity
//! filtering, cross-checking the summary counts against the detailed list,
//! display limiting, and comparing two scans.
//!
//! [`ScanResult`]: cscan_types::ScanResult

mod compare;
mod consistency;
mod normalize;
mod view;

pub use compare::{compare, ScanComparison};
pub use consistency::{check_consistency, ConsistencyReport, Discrepancy};
pub use normalize::normalize;
pub use view::{filter_by_severity, view, LimitedView};
