// File: brewbot-core/src/platforms/octoplus/client.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.octopus.energy/v1/graphql/";

/// Kraken session tokens last an hour; reuse them for a comfortably shorter
/// window so a token never expires mid-run.
const TOKEN_REUSE_WINDOW_MINUTES: i64 = 45;

/// Every remote call is one POST of this shape. Request documents live in
/// `requests/`; this struct is the only calling convention.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlEnvelope<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlError>>,
}

struct CachedToken {
    token: String,
    obtained_at: DateTime<Utc>,
}

/// GraphQL client for the Octoplus loyalty API.
///
/// Holds no per-account state beyond a session-token cache keyed by API key,
/// so one client serves every account in the process.
pub struct OctoplusClient {
    http: Arc<ReqwestClient>,
    endpoint: String,
    tokens: DashMap<String, CachedToken>,
}

impl OctoplusClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: Arc::new(ReqwestClient::new()),
            endpoint: endpoint.to_string(),
            tokens: DashMap::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn http_client(&self) -> Arc<ReqwestClient> {
        self.http.clone()
    }

    /// Session token for `api_key`, exchanging a new one when the cached
    /// token is past its reuse window.
    pub(crate) async fn token_for(&self, api_key: &str) -> Result<String, Error> {
        if let Some(cached) = self.tokens.get(api_key) {
            if Utc::now() - cached.obtained_at
                < Duration::minutes(TOKEN_REUSE_WINDOW_MINUTES)
            {
                return Ok(cached.token.clone());
            }
        }
        self.tokens.remove(api_key);

        let token = self.obtain_kraken_token(api_key).await?;
        self.tokens.insert(
            api_key.to_string(),
            CachedToken {
                token: token.clone(),
                obtained_at: Utc::now(),
            },
        );
        Ok(token)
    }

    /// Sends one GraphQL request and unwraps the response envelope.
    /// `auth_token` is the bare Kraken JWT; the API takes it without a
    /// scheme prefix. HTTP-level failures, GraphQL errors, and a missing
    /// data field all surface as `Error::Remote`.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        auth_token: Option<&str>,
        request: &GraphqlRequest,
    ) -> Result<T, Error> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(token) = auth_token {
            builder = builder.header("Authorization", token);
        }

        let resp = builder.send().await.map_err(|e| {
            Error::Remote(format!("{}: network error: {e}", request.operation_name))
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            Error::Remote(format!("{}: read body error: {e}", request.operation_name))
        })?;

        trace!("{} => HTTP {} => body={}", request.operation_name, status, body);

        if !status.is_success() {
            warn!("{} => status={} body={}", request.operation_name, status, body);
            return Err(Error::Remote(format!(
                "{}: HTTP {} => {}",
                request.operation_name, status, body
            )));
        }

        decode_envelope(request.operation_name, &body)
    }
}

/// Decodes a GraphQL response body, folding envelope-level errors and a
/// missing data field into `Error::Remote`.
fn decode_envelope<T: DeserializeOwned>(operation_name: &str, body: &str) -> Result<T, Error> {
    let envelope: GraphqlEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| Error::Remote(format!("{operation_name}: parse error: {e}")))?;

    if let Some(errors) = envelope.errors {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!("{} => GraphQL errors: {}", operation_name, joined);
            return Err(Error::Remote(format!("{operation_name}: {joined}")));
        }
    }

    envelope
        .data
        .ok_or_else(|| Error::Remote(format!("{operation_name}: response carried no data")))
}
