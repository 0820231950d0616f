//! Core library for qrattend.
//!
//! Scanned QR codes are matched against the Notion user directory and
//! recorded as attendance for the meeting scheduled today:
//!
//! - `api`: Notion REST client and the `Directory` seam
//! - `models`: users, meetings and attendance pages
//! - `cache`: time-boxed collection snapshots
//! - `checkin`: the reconciliation algorithm and attendance writer
//! - `qr`: QR decoding and encoding
//! - `config`: environment configuration

pub mod api;
pub mod cache;
pub mod checkin;
pub mod config;
pub mod models;
pub mod qr;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, Directory};
pub use cache::{DirectoryCache, ResourceKind};
pub use checkin::{reconcile, CheckInError, CheckInOutcome};
pub use config::Config;
