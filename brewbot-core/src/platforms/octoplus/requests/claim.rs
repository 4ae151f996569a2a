//! The claim mutation. Returns only a reward handle; voucher code and
//! barcode come from the claimed-voucher listing afterwards.

use serde::Deserialize;
use tracing::debug;

use brewbot_common::models::voucher::ClaimedReward;
use crate::platforms::octoplus::client::{GraphqlRequest, OctoplusClient};
use crate::Error;

const CLAIM_OCTOPLUS_OFFER: &str = r#"
mutation ClaimOctoplusOffer($accountNumber: String!, $slug: String!) {
  claimOctoplusOffer(input: { accountNumber: $accountNumber, slug: $slug }) {
    claimedOffer {
      id
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimOctoplusOfferData {
    claim_octoplus_offer: Option<ClaimPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimPayload {
    claimed_offer: Option<ClaimedOffer>,
}

#[derive(Debug, Deserialize)]
struct ClaimedOffer {
    id: String,
}

impl OctoplusClient {
    pub async fn send_claim_offer(
        &self,
        token: &str,
        account_number: &str,
        offer_slug: &str,
    ) -> Result<ClaimedReward, Error> {
        let request = GraphqlRequest {
            operation_name: "ClaimOctoplusOffer",
            query: CLAIM_OCTOPLUS_OFFER,
            variables: serde_json::json!({
                "accountNumber": account_number,
                "slug": offer_slug,
            }),
        };

        let data: ClaimOctoplusOfferData = self.execute(Some(token), &request).await?;
        let claimed = data
            .claim_octoplus_offer
            .and_then(|p| p.claimed_offer)
            .ok_or_else(|| {
                Error::Remote("ClaimOctoplusOffer: claim accepted but no reward returned".to_string())
            })?;

        debug!(
            "send_claim_offer => account='{}' slug='{}' reward_id='{}'",
            account_number, offer_slug, claimed.id
        );
        Ok(ClaimedReward {
            reward_id: claimed.id,
        })
    }
}
