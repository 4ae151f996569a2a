// File: brewbot-common/src/traits/repository_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::claim_state::ClaimState;
use crate::models::account::CredentialRecord;

/// Storage for the single claim-state row each account keeps.
#[async_trait]
pub trait ClaimStateRepository: Send + Sync {
    async fn get(&self, account_number: &str) -> Result<Option<ClaimState>, Error>;
    /// Upserts by account number.
    async fn put(&self, state: &ClaimState) -> Result<(), Error>;
    async fn delete(&self, account_number: &str) -> Result<(), Error>;
    /// Removes rows whose retention horizon has passed; returns how many.
    async fn purge_expired(&self) -> Result<u64, Error>;
}

/// Encrypted-at-rest credential records, keyed by account id.
#[async_trait]
pub trait AccountCredentialsRepository: Send + Sync {
    async fn store(&self, account_id: &str, record: &CredentialRecord) -> Result<(), Error>;
    async fn get(&self, account_id: &str) -> Result<Option<CredentialRecord>, Error>;
    async fn delete(&self, account_id: &str) -> Result<(), Error>;
    async fn list_account_ids(&self) -> Result<Vec<String>, Error>;
}

/// Simple key/value app configuration.
#[async_trait]
pub trait AppConfigRepository: Send + Sync {
    async fn set_value(&self, key: &str, value: &str) -> Result<(), Error>;
    async fn get_value(&self, key: &str) -> Result<Option<String>, Error>;
    async fn delete_value(&self, key: &str) -> Result<(), Error>;
}
