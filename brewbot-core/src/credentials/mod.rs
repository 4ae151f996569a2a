// brewbot-core/src/credentials/mod.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use brewbot_common::models::account::{AccountIdentity, CredentialRecord, ResolvedAccount};
use brewbot_common::traits::repository_traits::AccountCredentialsRepository;
use crate::Error;

static ACCOUNT_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^A-[A-Z0-9]{8}$").expect("account number pattern"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

const API_KEY_PREFIX: &str = "sk_";

struct CacheEntry {
    account: ResolvedAccount,
    cached_at: DateTime<Utc>,
}

/// Resolves account ids to validated, ready-to-use accounts.
///
/// Decrypted records are cached per account id with a TTL so repeated
/// triggers in one period do not hit the database every time. `clear_cache`
/// exists for credential rotation.
pub struct CredentialProvider {
    repo: Arc<dyn AccountCredentialsRepository>,
    cache: DashMap<String, CacheEntry>,
    cache_ttl: Duration,
}

impl CredentialProvider {
    pub fn new(repo: Arc<dyn AccountCredentialsRepository>) -> Self {
        Self::with_cache_ttl(repo, Duration::minutes(5))
    }

    pub fn with_cache_ttl(repo: Arc<dyn AccountCredentialsRepository>, cache_ttl: Duration) -> Self {
        Self {
            repo,
            cache: DashMap::new(),
            cache_ttl,
        }
    }

    /// Fetches, decrypts, and validates the record for `account_id`.
    /// A missing record is a configuration error, not a quiet skip.
    pub async fn resolve(&self, account_id: &str) -> Result<ResolvedAccount, Error> {
        if let Some(entry) = self.cache.get(account_id) {
            if Utc::now() - entry.cached_at < self.cache_ttl {
                return Ok(entry.account.clone());
            }
        }
        // Stale or absent; drop any stale entry before refetching.
        self.cache.remove(account_id);

        let record = self
            .repo
            .get(account_id)
            .await?
            .ok_or_else(|| Error::Config(format!("no credentials stored for account '{account_id}'")))?;

        let account = validate_record(account_id, record)?;
        self.cache.insert(
            account_id.to_string(),
            CacheEntry {
                account: account.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(account)
    }

    /// Every account id with stored credentials, for full sweeps.
    pub async fn list_account_ids(&self) -> Result<Vec<String>, Error> {
        self.repo.list_account_ids().await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Checks the structural rules a record must satisfy before any remote call:
/// `sk_`-prefixed API key and an `A-XXXXXXXX` account number. Invalid
/// notification addresses are dropped with a warning rather than failing the
/// whole account.
fn validate_record(account_id: &str, record: CredentialRecord) -> Result<ResolvedAccount, Error> {
    if !record.api_key.starts_with(API_KEY_PREFIX) {
        return Err(Error::Config(format!(
            "API key for account '{account_id}' is malformed"
        )));
    }
    if !ACCOUNT_NUMBER_RE.is_match(&record.account_number) {
        return Err(Error::Config(format!(
            "account number '{}' for account '{account_id}' is malformed",
            record.account_number
        )));
    }

    let mut notify_addresses = Vec::with_capacity(record.emails.len());
    for address in &record.emails {
        if EMAIL_RE.is_match(address) {
            notify_addresses.push(address.clone());
        } else {
            warn!("dropping invalid notification address '{address}' for account '{account_id}'");
        }
    }

    Ok(ResolvedAccount {
        identity: AccountIdentity {
            account_id: account_id.to_string(),
            account_number: record.account_number,
            api_key: record.api_key,
        },
        nickname: record.nickname,
        notify_addresses,
    })
}
