#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Scan session orchestration for cscan
//!
//! A [`ScanController`] owns one scan at a time: it submits the request,
//! starts a status poller task, applies the poller's messages in receipt
//! order, reconciles the final result and keeps a bounded [`ScanHistory`].
//! Independent controllers share nothing and may run side by side.

mod catalog;
mod controller;
mod history;
mod poller;

pub use catalog::CatalogClient;
pub use controller::{ScanController, ScanOutcome, SessionUpdate};
pub use history::ScanHistory;
