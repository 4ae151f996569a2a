// File: brewbot-common/src/models/voucher.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A voucher as reported by the loyalty API's claimed-voucher listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    pub barcode: String,
    /// Absent when the remote record carries no expiry; such vouchers are
    /// treated as usable.
    pub expires_at: Option<DateTime<Utc>>,
    pub account_number: String,
}

impl Voucher {
    /// A voucher is usable while unexpired; one with no recorded expiry is
    /// always usable.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => true,
        }
    }
}

/// Result of a successful claim mutation. The reward id is only useful for
/// correlating against the voucher listing afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaimedReward {
    pub reward_id: String,
}
