// File: brewbot-common/src/models/account.rs

use serde::{Deserialize, Serialize};

/// Validated identity for one loyalty account. Both formats are checked by
/// the credential provider before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Opaque handle the trigger and credential lookup use.
    pub account_id: String,
    /// Loyalty account number, `A-` followed by eight uppercase
    /// alphanumerics.
    pub account_number: String,
    /// API key, `sk_` prefixed.
    pub api_key: String,
}

/// Credential record as stored (encrypted) per account. Field names follow
/// the external record format exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub api_key: String,
    pub account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub emails: Vec<String>,
}

/// A fully resolved account: validated identity plus notification targets.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    pub identity: AccountIdentity,
    pub nickname: Option<String>,
    /// Addresses that passed syntax validation; invalid ones are dropped at
    /// resolution time, not treated as errors.
    pub notify_addresses: Vec<String>,
}
