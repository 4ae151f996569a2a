//! Offer catalog lookup. The remote lists every offer the account can see;
//! the status for one slug is derived by filtering that list, and a slug
//! missing from the list is a not-found status rather than an error.

use serde::Deserialize;
use tracing::debug;

use brewbot_common::models::offer::{CannotClaimReason, OfferStatus};
use crate::platforms::octoplus::client::{GraphqlRequest, OctoplusClient};
use crate::Error;

const OCTOPLUS_OFFERS: &str = r#"
query OctoplusOffers($accountNumber: String!) {
  octoplusOffers(accountNumber: $accountNumber) {
    slug
    claimable
    cannotClaimReason
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OctoplusOffersData {
    octoplus_offers: Option<Vec<OfferEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferEntry {
    slug: String,
    claimable: bool,
    cannot_claim_reason: Option<String>,
}

impl OctoplusClient {
    pub async fn fetch_offer_status(
        &self,
        token: &str,
        account_number: &str,
        offer_slug: &str,
    ) -> Result<OfferStatus, Error> {
        let request = GraphqlRequest {
            operation_name: "OctoplusOffers",
            query: OCTOPLUS_OFFERS,
            variables: serde_json::json!({ "accountNumber": account_number }),
        };

        let data: OctoplusOffersData = self.execute(Some(token), &request).await?;
        let offers = data.octoplus_offers.unwrap_or_default();

        let status = match offers.into_iter().find(|o| o.slug == offer_slug) {
            None => OfferStatus::not_found(),
            Some(entry) if entry.claimable => OfferStatus::claimable(),
            Some(entry) => {
                let reason = entry
                    .cannot_claim_reason
                    .as_deref()
                    .map(CannotClaimReason::from_raw)
                    .unwrap_or_else(|| CannotClaimReason::Other("UNSPECIFIED".to_string()));
                OfferStatus::blocked(reason)
            }
        };

        debug!(
            "fetch_offer_status => account='{}' slug='{}' found={} can_claim={}",
            account_number, offer_slug, status.found, status.can_claim
        );
        Ok(status)
    }
}
