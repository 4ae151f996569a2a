//! Claimed-voucher listing. The remote returns most recent first; that
//! ordering is relied on, not re-sorted.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use brewbot_common::models::voucher::Voucher;
use crate::platforms::octoplus::client::{GraphqlRequest, OctoplusClient};
use crate::Error;

const OCTOPLUS_CLAIMED_OFFERS: &str = r#"
query OctoplusClaimedOffers($accountNumber: String!, $slug: String!) {
  octoplusClaimedOffers(accountNumber: $accountNumber, slug: $slug) {
    voucherCode
    barcode
    expiresAt
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimedOffersData {
    octoplus_claimed_offers: Option<Vec<ClaimedOfferEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimedOfferEntry {
    voucher_code: String,
    barcode: String,
    expires_at: Option<DateTime<Utc>>,
}

impl OctoplusClient {
    pub async fn fetch_claimed_vouchers(
        &self,
        token: &str,
        account_number: &str,
        offer_slug: &str,
    ) -> Result<Vec<Voucher>, Error> {
        let request = GraphqlRequest {
            operation_name: "OctoplusClaimedOffers",
            query: OCTOPLUS_CLAIMED_OFFERS,
            variables: serde_json::json!({
                "accountNumber": account_number,
                "slug": offer_slug,
            }),
        };

        let data: ClaimedOffersData = self.execute(Some(token), &request).await?;
        let vouchers = data
            .octoplus_claimed_offers
            .unwrap_or_default()
            .into_iter()
            .map(|entry| Voucher {
                code: entry.voucher_code,
                barcode: entry.barcode,
                expires_at: entry.expires_at,
                account_number: account_number.to_string(),
            })
            .collect::<Vec<_>>();

        debug!(
            "fetch_claimed_vouchers => account='{}' slug='{}' count={}",
            account_number,
            offer_slug,
            vouchers.len()
        );
        Ok(vouchers)
    }
}
