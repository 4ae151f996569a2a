// File: brewbot-common/src/models/claim_state.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::voucher::Voucher;

/// Persisted record of the most recent claim for one account. One row per
/// account; a new claim overwrites the previous period's row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClaimState {
    pub account_number: String,
    pub voucher_code: String,
    pub barcode: String,
    pub expires_at: DateTime<Utc>,
    pub claimed_at: DateTime<Utc>,
    pub email_sent: bool,
    /// Retention horizon for cleanup; always one period past `expires_at`.
    pub ttl_at: DateTime<Utc>,
}

impl ClaimState {
    /// State for a voucher claimed just now. The stored expiry is always a
    /// full period out regardless of what the remote record says, so the
    /// row stays fresh for the whole period.
    pub fn fresh_claim(voucher: &Voucher, now: DateTime<Utc>, period: Duration) -> Self {
        let expires_at = now + period;
        ClaimState {
            account_number: voucher.account_number.clone(),
            voucher_code: voucher.code.clone(),
            barcode: voucher.barcode.clone(),
            expires_at,
            claimed_at: now,
            email_sent: false,
            ttl_at: expires_at + period,
        }
    }

    /// State recovered from a voucher that was claimed earlier (outside this
    /// service, or before a lost write). Uses the voucher's own expiry when
    /// it is still in the future, otherwise falls back to a full period.
    pub fn recovered(voucher: &Voucher, now: DateTime<Utc>, period: Duration) -> Self {
        let expires_at = match voucher.expires_at {
            Some(expiry) if expiry > now => expiry,
            _ => now + period,
        };
        ClaimState {
            account_number: voucher.account_number.clone(),
            voucher_code: voucher.code.clone(),
            barcode: voucher.barcode.clone(),
            expires_at,
            claimed_at: now,
            email_sent: false,
            ttl_at: expires_at + period,
        }
    }

    /// Fresh means the stored voucher has not yet expired.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
