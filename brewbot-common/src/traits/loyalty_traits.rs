// File: brewbot-common/src/traits/loyalty_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::account::AccountIdentity;
use crate::models::offer::OfferStatus;
use crate::models::voucher::{ClaimedReward, Voucher};

/// Remote loyalty platform operations the reconciler needs. One
/// implementation per upstream API; tests substitute their own.
#[async_trait]
pub trait LoyaltyApi: Send + Sync {
    /// Looks up one named offer as this account sees it. An offer absent
    /// from the account's catalog is a `found = false` status, not an error.
    async fn offer_status(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<OfferStatus, Error>;

    /// Claims the offer. Only call after `offer_status` reported it
    /// claimable in the same run; the reward handle is all the remote
    /// returns, voucher details come from `claimed_vouchers`.
    async fn claim_offer(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<ClaimedReward, Error>;

    /// Vouchers already claimed for the offer, most recent first.
    async fn claimed_vouchers(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<Vec<Voucher>, Error>;
}
