//! Kraken token exchange: turns a long-lived API key into a short-lived
//! session token the other operations authenticate with.

use serde::Deserialize;
use tracing::debug;

use crate::platforms::octoplus::client::{GraphqlRequest, OctoplusClient};
use crate::Error;

const OBTAIN_KRAKEN_TOKEN: &str = r#"
mutation ObtainKrakenToken($apiKey: String!) {
  obtainKrakenToken(input: { APIKey: $apiKey }) {
    token
  }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObtainKrakenTokenData {
    obtain_kraken_token: Option<KrakenToken>,
}

#[derive(Debug, Deserialize)]
struct KrakenToken {
    token: String,
}

impl OctoplusClient {
    pub async fn obtain_kraken_token(&self, api_key: &str) -> Result<String, Error> {
        let request = GraphqlRequest {
            operation_name: "ObtainKrakenToken",
            query: OBTAIN_KRAKEN_TOKEN,
            variables: serde_json::json!({ "apiKey": api_key }),
        };

        let data: ObtainKrakenTokenData = self.execute(None, &request).await?;
        let payload = data.obtain_kraken_token.ok_or_else(|| {
            Error::Remote("ObtainKrakenToken: no token in response".to_string())
        })?;

        debug!("obtain_kraken_token => token acquired");
        Ok(payload.token)
    }
}
