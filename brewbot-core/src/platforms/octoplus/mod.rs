// File: brewbot-core/src/platforms/octoplus/mod.rs

pub mod client;
pub mod requests;

pub use client::{OctoplusClient, DEFAULT_ENDPOINT};

use async_trait::async_trait;

use brewbot_common::models::account::AccountIdentity;
use brewbot_common::models::offer::OfferStatus;
use brewbot_common::models::voucher::{ClaimedReward, Voucher};
use brewbot_common::traits::loyalty_traits::LoyaltyApi;
use crate::Error;

#[async_trait]
impl LoyaltyApi for OctoplusClient {
    async fn offer_status(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<OfferStatus, Error> {
        let token = self.token_for(&identity.api_key).await?;
        self.fetch_offer_status(&token, &identity.account_number, offer_slug)
            .await
    }

    async fn claim_offer(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<ClaimedReward, Error> {
        let token = self.token_for(&identity.api_key).await?;
        self.send_claim_offer(&token, &identity.account_number, offer_slug)
            .await
    }

    async fn claimed_vouchers(
        &self,
        identity: &AccountIdentity,
        offer_slug: &str,
    ) -> Result<Vec<Voucher>, Error> {
        let token = self.token_for(&identity.api_key).await?;
        self.fetch_claimed_vouchers(&token, &identity.account_number, offer_slug)
            .await
    }
}
