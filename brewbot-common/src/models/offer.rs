// File: brewbot-common/src/models/offer.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an offer that exists cannot currently be claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CannotClaimReason {
    OutOfStock,
    MaxClaimsPerPeriodReached,
    Other(String),
}

impl CannotClaimReason {
    /// Maps a raw reason string from the remote API onto a known reason.
    /// Unknown strings are preserved verbatim in `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "OUT_OF_STOCK" => CannotClaimReason::OutOfStock,
            "MAX_CLAIMS_PER_PERIOD_REACHED" => CannotClaimReason::MaxClaimsPerPeriodReached,
            other => CannotClaimReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CannotClaimReason::OutOfStock => "OUT_OF_STOCK",
            CannotClaimReason::MaxClaimsPerPeriodReached => "MAX_CLAIMS_PER_PERIOD_REACHED",
            CannotClaimReason::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for CannotClaimReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current standing of the weekly offer for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferStatus {
    /// False when the offer id is not visible to this account at all.
    pub found: bool,
    pub can_claim: bool,
    pub cannot_claim_reason: Option<CannotClaimReason>,
}

impl OfferStatus {
    pub fn not_found() -> Self {
        OfferStatus {
            found: false,
            can_claim: false,
            cannot_claim_reason: None,
        }
    }

    pub fn claimable() -> Self {
        OfferStatus {
            found: true,
            can_claim: true,
            cannot_claim_reason: None,
        }
    }

    pub fn blocked(reason: CannotClaimReason) -> Self {
        OfferStatus {
            found: true,
            can_claim: false,
            cannot_claim_reason: Some(reason),
        }
    }
}
