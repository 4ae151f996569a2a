// tests/credential_provider_tests.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;

use brewbot_common::models::account::CredentialRecord;
use brewbot_common::traits::repository_traits::AccountCredentialsRepository;
use brewbot_core::credentials::CredentialProvider;
use brewbot_core::Error;

#[derive(Default)]
struct MockAccountCredentialsRepository {
    records: DashMap<String, CredentialRecord>,
    get_calls: AtomicUsize,
}

#[async_trait]
impl AccountCredentialsRepository for MockAccountCredentialsRepository {
    async fn store(&self, account_id: &str, record: &CredentialRecord) -> Result<(), Error> {
        self.records.insert(account_id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, account_id: &str) -> Result<Option<CredentialRecord>, Error> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.get(account_id).map(|e| e.value().clone()))
    }

    async fn delete(&self, account_id: &str) -> Result<(), Error> {
        self.records.remove(account_id);
        Ok(())
    }

    async fn list_account_ids(&self) -> Result<Vec<String>, Error> {
        let mut ids: Vec<String> = self.records.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

fn record(api_key: &str, account_number: &str, emails: &[&str]) -> CredentialRecord {
    CredentialRecord {
        api_key: api_key.to_string(),
        account_number: account_number.to_string(),
        nickname: Some("Maple".to_string()),
        emails: emails.iter().map(|e| e.to_string()).collect(),
    }
}

fn seeded(record: CredentialRecord) -> Arc<MockAccountCredentialsRepository> {
    let repo = MockAccountCredentialsRepository::default();
    repo.records.insert("acct-1".to_string(), record);
    Arc::new(repo)
}

#[tokio::test]
async fn resolves_valid_record_and_caches() {
    let repo = seeded(record(
        "sk_live_xyz",
        "A-1B2C3D4E",
        &["maple@example.com", "backup@example.com"],
    ));
    let provider = CredentialProvider::new(repo.clone());

    let account = provider.resolve("acct-1").await.unwrap();
    assert_eq!(account.identity.account_id, "acct-1");
    assert_eq!(account.identity.account_number, "A-1B2C3D4E");
    assert_eq!(account.identity.api_key, "sk_live_xyz");
    assert_eq!(account.nickname.as_deref(), Some("Maple"));
    assert_eq!(
        account.notify_addresses,
        vec!["maple@example.com", "backup@example.com"]
    );

    provider.resolve("acct-1").await.unwrap();
    assert_eq!(repo.get_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_cache_entry_is_refetched() {
    let repo = seeded(record("sk_live_xyz", "A-1B2C3D4E", &["maple@example.com"]));
    let provider = CredentialProvider::with_cache_ttl(repo.clone(), Duration::zero());

    provider.resolve("acct-1").await.unwrap();
    provider.resolve("acct-1").await.unwrap();
    assert_eq!(repo.get_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let repo = seeded(record("sk_live_xyz", "A-1B2C3D4E", &["maple@example.com"]));
    let provider = CredentialProvider::new(repo.clone());

    provider.resolve("acct-1").await.unwrap();
    provider.clear_cache();
    provider.resolve("acct-1").await.unwrap();
    assert_eq!(repo.get_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rejects_api_key_without_expected_prefix() {
    let repo = seeded(record("pk_live_xyz", "A-1B2C3D4E", &["maple@example.com"]));
    let provider = CredentialProvider::new(repo);

    let msg = match provider.resolve("acct-1").await.unwrap_err() {
        Error::Config(msg) => msg,
        other => panic!("expected a configuration error, got {other}"),
    };
    assert!(msg.contains("acct-1"));
    // The key itself never appears in the error.
    assert!(!msg.contains("pk_live_xyz"));
}

#[tokio::test]
async fn rejects_malformed_account_numbers() {
    for bad in ["B-12345678", "A-12", "A-1B2C3D4E5", "A-1b2c3d4e", ""] {
        let repo = seeded(record("sk_live_xyz", bad, &["maple@example.com"]));
        let provider = CredentialProvider::new(repo);

        let err = provider.resolve("acct-1").await.unwrap_err();
        assert!(
            matches!(err, Error::Config(_)),
            "'{bad}' should have been rejected"
        );
    }
}

#[tokio::test]
async fn invalid_notification_addresses_are_dropped() {
    let repo = seeded(record(
        "sk_live_xyz",
        "A-1B2C3D4E",
        &["maple@example.com", "not-an-email", "spaces in@example.com"],
    ));
    let provider = CredentialProvider::new(repo);

    let account = provider.resolve("acct-1").await.unwrap();
    assert_eq!(account.notify_addresses, vec!["maple@example.com"]);
}

#[tokio::test]
async fn record_with_no_valid_addresses_still_resolves() {
    let repo = seeded(record("sk_live_xyz", "A-1B2C3D4E", &["bogus"]));
    let provider = CredentialProvider::new(repo);

    let account = provider.resolve("acct-1").await.unwrap();
    assert!(account.notify_addresses.is_empty());
}

#[tokio::test]
async fn missing_record_is_a_config_error() {
    let provider =
        CredentialProvider::new(Arc::new(MockAccountCredentialsRepository::default()));

    let msg = match provider.resolve("acct-ghost").await.unwrap_err() {
        Error::Config(msg) => msg,
        other => panic!("expected a configuration error, got {other}"),
    };
    assert!(msg.contains("acct-ghost"));
}
