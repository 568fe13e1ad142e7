//! Quota usage module
//!
//! Fetching and modelling the remote usage quota:
//! - API token storage and local validation
//! - Single-shot HTTP fetch of the quota usage endpoint
//! - Snapshot and cache types
//! - Error classification

pub mod api;
pub mod credentials;
pub mod error;
pub mod types;
