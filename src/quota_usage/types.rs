use chrono::{DateTime, Local};
use serde::Deserialize;

use super::error::QuotaError;

/// Quota usage response body (field names as sent by the API)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuotaUsageApiResponse {
    /// Quota ceiling
    pub quota: Option<f64>,
    /// Amount consumed, may be fractional
    pub used: Option<f64>,
}

/// One successful quota read
///
/// Only `total` and `used` are stored. Percentage and remaining are always
/// derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSnapshot {
    total: f64,
    used: f64,
}

impl QuotaSnapshot {
    /// Build a snapshot, rejecting a total that would poison the percentage
    pub fn new(total: f64, used: f64) -> Result<Self, QuotaError> {
        if !total.is_finite() || total <= 0.0 {
            return Err(QuotaError::DivisionGuard);
        }
        if !used.is_finite() {
            return Err(QuotaError::InvalidResponse(format!(
                "used amount is not a number: {used}"
            )));
        }
        Ok(Self { total, used })
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn used(&self) -> f64 {
        self.used
    }

    /// `round(used / total * 100)`
    pub fn percentage(&self) -> i64 {
        (self.used / self.total * 100.0).round() as i64
    }

    /// `total - used`, unrounded
    pub fn remaining(&self) -> f64 {
        self.total - self.used
    }
}

impl TryFrom<QuotaUsageApiResponse> for QuotaSnapshot {
    type Error = QuotaError;

    fn try_from(api: QuotaUsageApiResponse) -> Result<Self, Self::Error> {
        let total = api.quota.ok_or(QuotaError::DivisionGuard)?;
        let used = api
            .used
            .ok_or_else(|| QuotaError::InvalidResponse("missing `used` field".to_string()))?;
        QuotaSnapshot::new(total, used)
    }
}

/// Last successful snapshot and when it was taken
#[derive(Debug, Clone, Default)]
pub struct CachedState {
    pub last_snapshot: Option<QuotaSnapshot>,
    pub last_updated_at: Option<DateTime<Local>>,
}

impl CachedState {
    /// Overwrite with a fresh successful read
    pub fn store(&mut self, snapshot: QuotaSnapshot, at: DateTime<Local>) {
        self.last_snapshot = Some(snapshot);
        self.last_updated_at = Some(at);
    }
}
