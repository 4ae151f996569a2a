// tests/reconciler_tests.rs

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;

use brewbot_common::models::account::{AccountIdentity, CredentialRecord, ResolvedAccount};
use brewbot_common::models::claim_state::ClaimState;
use brewbot_common::models::offer::{CannotClaimReason, OfferStatus};
use brewbot_common::models::outcome::ReconcileOutcome;
use brewbot_common::models::voucher::{ClaimedReward, Voucher};
use brewbot_common::traits::loyalty_traits::LoyaltyApi;
use brewbot_common::traits::notifier_traits::VoucherNotifier;
use brewbot_common::traits::repository_traits::{
    AccountCredentialsRepository, ClaimStateRepository,
};
use brewbot_core::credentials::CredentialProvider;
use brewbot_core::services::{ClaimReconciler, ReconcilerPolicy};
use brewbot_core::Error;

const ACCOUNT_ID: &str = "acct-primary";
const ACCOUNT_NUMBER: &str = "A-1B2C3D4E";

// ---- mocks ----------------------------------------------------------------

#[derive(Default)]
struct MockAccountCredentialsRepository {
    records: DashMap<String, CredentialRecord>,
}

#[async_trait]
impl AccountCredentialsRepository for MockAccountCredentialsRepository {
    async fn store(&self, account_id: &str, record: &CredentialRecord) -> Result<(), Error> {
        self.records.insert(account_id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, account_id: &str) -> Result<Option<CredentialRecord>, Error> {
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

#[derive(Default)]
struct MockClaimStateRepository {
    rows: DashMap<String, ClaimState>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    put_calls: AtomicUsize,
}

#[async_trait]
impl ClaimStateRepository for MockClaimStateRepository {
    async fn get(&self, account_number: &str) -> Result<Option<ClaimState>, Error> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.rows.get(account_number).map(|e| e.value().clone()))
    }

    async fn put(&self, state: &ClaimState) -> Result<(), Error> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        self.rows
            .insert(state.account_number.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, account_number: &str) -> Result<(), Error> {
        self.rows.remove(account_number);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let before = self.rows.len();
        self.rows.retain(|_, v| v.ttl_at >= now);
        Ok((before - self.rows.len()) as u64)
    }
}

struct MockLoyaltyApi {
    status: OfferStatus,
    claim_reward: Option<ClaimedReward>,
    vouchers: Vec<Voucher>,
    fail_offer_status: bool,
    offer_status_calls: AtomicUsize,
    claim_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MockLoyaltyApi {
    fn new(status: OfferStatus) -> Self {
        Self {
            status,
            claim_reward: None,
            vouchers: Vec::new(),
            fail_offer_status: false,
            offer_status_calls: AtomicUsize::new(0),
            claim_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    fn with_claim(mut self, reward_id: &str) -> Self {
        self.claim_reward = Some(ClaimedReward {
            reward_id: reward_id.to_string(),
        });
        self
    }

    fn with_vouchers(mut self, vouchers: Vec<Voucher>) -> Self {
        self.vouchers = vouchers;
        self
    }

    fn failing(mut self) -> Self {
        self.fail_offer_status = true;
        self
    }
}

#[async_trait]
impl LoyaltyApi for MockLoyaltyApi {
    async fn offer_status(
        &self,
        _identity: &AccountIdentity,
        _offer_slug: &str,
    ) -> Result<OfferStatus, Error> {
        self.offer_status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_offer_status {
            return Err(Error::Remote("offer lookup unavailable".to_string()));
        }
        Ok(self.status.clone())
    }

    async fn claim_offer(
        &self,
        _identity: &AccountIdentity,
        _offer_slug: &str,
    ) -> Result<ClaimedReward, Error> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.claim_reward
            .clone()
            .ok_or_else(|| Error::Remote("claim rejected".to_string()))
    }

    async fn claimed_vouchers(
        &self,
        _identity: &AccountIdentity,
        _offer_slug: &str,
    ) -> Result<Vec<Voucher>, Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vouchers.clone())
    }
}

#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

#[async_trait]
impl VoucherNotifier for MockNotifier {
    async fn send_voucher(
        &self,
        account: &ResolvedAccount,
        state: &ClaimState,
    ) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Notification("send failed".to_string()));
        }
        self.sent.lock().unwrap().push((
            account.identity.account_number.clone(),
            state.voucher_code.clone(),
        ));
        Ok(())
    }
}

// ---- harness ---------------------------------------------------------------

struct Harness {
    loyalty: Arc<MockLoyaltyApi>,
    store: Arc<MockClaimStateRepository>,
    notifier: Arc<MockNotifier>,
    reconciler: ClaimReconciler,
}

impl Harness {
    fn new(loyalty: MockLoyaltyApi) -> Self {
        Self::with_policy(loyalty, ReconcilerPolicy::default())
    }

    fn with_policy(loyalty: MockLoyaltyApi, policy: ReconcilerPolicy) -> Self {
        let creds_repo = MockAccountCredentialsRepository::default();
        creds_repo.records.insert(
            ACCOUNT_ID.to_string(),
            CredentialRecord {
                api_key: "sk_test_abc".to_string(),
                account_number: ACCOUNT_NUMBER.to_string(),
                nickname: Some("Maple".to_string()),
                emails: vec!["maple@example.com".to_string()],
            },
        );

        let loyalty = Arc::new(loyalty);
        let store = Arc::new(MockClaimStateRepository::default());
        let notifier = Arc::new(MockNotifier::default());
        let reconciler = ClaimReconciler::new(
            Arc::new(CredentialProvider::new(Arc::new(creds_repo))),
            loyalty.clone(),
            store.clone(),
            notifier.clone(),
            policy,
        );
        Self {
            loyalty,
            store,
            notifier,
            reconciler,
        }
    }

    fn stored_state(&self) -> Option<ClaimState> {
        self.store
            .rows
            .get(ACCOUNT_NUMBER)
            .map(|e| e.value().clone())
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.notifier.sent.lock().unwrap().clone()
    }
}

fn voucher(code: &str, barcode: &str, expires_in_hours: Option<i64>) -> Voucher {
    Voucher {
        code: code.to_string(),
        barcode: barcode.to_string(),
        expires_at: expires_in_hours.map(|h| Utc::now() + Duration::hours(h)),
        account_number: ACCOUNT_NUMBER.to_string(),
    }
}

fn stored_state(code: &str, expires_in_hours: i64, email_sent: bool) -> ClaimState {
    let now = Utc::now();
    let expires_at = now + Duration::hours(expires_in_hours);
    ClaimState {
        account_number: ACCOUNT_NUMBER.to_string(),
        voucher_code: code.to_string(),
        barcode: "111222333".to_string(),
        expires_at,
        claimed_at: now - Duration::days(1),
        email_sent,
        ttl_at: expires_at + Duration::days(7),
    }
}

// ---- claim path ------------------------------------------------------------

#[tokio::test]
async fn claims_fresh_voucher_end_to_end() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::claimable())
            .with_claim("reward-1")
            .with_vouchers(vec![voucher("ABC123", "999888777", Some(24 * 14))]),
    );

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::Claimed);
    assert_eq!(run.voucher_code.as_deref(), Some("ABC123"));
    assert!(run.email_sent);

    let state = h.stored_state().expect("state persisted");
    assert_eq!(state.voucher_code, "ABC123");
    assert_eq!(state.barcode, "999888777");
    assert!(state.expires_at > state.claimed_at);
    assert!(state.email_sent);

    assert_eq!(
        h.sent(),
        vec![(ACCOUNT_NUMBER.to_string(), "ABC123".to_string())]
    );
}

#[tokio::test]
async fn second_run_after_claim_skips() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::claimable())
            .with_claim("reward-1")
            .with_vouchers(vec![voucher("ABC123", "999888777", Some(24 * 14))]),
    );

    let first = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(first.outcome, ReconcileOutcome::Claimed);

    let second = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(second.outcome, ReconcileOutcome::Skip);
    assert_eq!(second.voucher_code.as_deref(), Some("ABC123"));

    // The second pass never went near the remote or the mailer.
    assert_eq!(h.loyalty.offer_status_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.loyalty.claim_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.loyalty.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test]
async fn stale_state_is_overwritten_by_new_claim() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::claimable())
            .with_claim("reward-2")
            .with_vouchers(vec![voucher("NEW456", "777666555", Some(24 * 14))]),
    );
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("OLD111", -2, true));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::Claimed);

    let state = h.stored_state().unwrap();
    assert_eq!(state.voucher_code, "NEW456");
    assert!(state.email_sent);
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test]
async fn claim_without_voucher_listing_is_surfaced() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()).with_claim("reward-1"));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::ClaimSucceededButVoucherMissing);
    assert!(run.outcome.is_execution_failure());
    assert!(h.stored_state().is_none());
    assert!(h.sent().is_empty());
}

// ---- skip and pending-email paths -------------------------------------------

#[tokio::test]
async fn fresh_emailed_state_skips_without_remote_calls() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()).with_claim("reward-1"));
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("KEEP99", 2, true));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::Skip);
    assert!(run.email_sent);

    assert_eq!(h.loyalty.offer_status_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.loyalty.claim_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.loyalty.list_calls.load(Ordering::SeqCst), 0);
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn pending_email_goes_out_without_new_claim() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()).with_claim("reward-1"));
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("WAIT42", 2, false));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::EmailSent);
    assert_eq!(run.voucher_code.as_deref(), Some("WAIT42"));

    assert!(h.stored_state().unwrap().email_sent);
    assert_eq!(
        h.sent(),
        vec![(ACCOUNT_NUMBER.to_string(), "WAIT42".to_string())]
    );
    assert_eq!(h.loyalty.offer_status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn email_flag_is_marked_even_when_send_fails() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()));
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("WAIT42", 2, false));
    h.notifier.fail.store(true, Ordering::SeqCst);

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::EmailSent);

    // Flag went durable before the send was attempted; the failed send does
    // not roll it back.
    assert!(h.stored_state().unwrap().email_sent);
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn force_send_resends_even_when_marked() {
    let policy = ReconcilerPolicy {
        force_send: true,
        ..ReconcilerPolicy::default()
    };
    let h = Harness::with_policy(MockLoyaltyApi::new(OfferStatus::claimable()), policy);
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("KEEP99", 2, true));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::EmailSent);
    assert_eq!(
        h.sent(),
        vec![(ACCOUNT_NUMBER.to_string(), "KEEP99".to_string())]
    );
}

// ---- blocked-claim paths -----------------------------------------------------

#[tokio::test]
async fn missing_offer_reports_not_found() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::not_found()));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::OfferNotFound);
    assert_eq!(h.loyalty.claim_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.loyalty.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn out_of_stock_with_nothing_to_recover_retries_later() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::blocked(
        CannotClaimReason::OutOfStock,
    )));

    let first = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(first.outcome, ReconcileOutcome::OutOfStock);
    assert!(first.outcome.is_retryable());

    // Re-invocation converges on the same answer until something changes.
    let second = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(second.outcome, ReconcileOutcome::OutOfStock);
    assert!(h.stored_state().is_none());
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn out_of_stock_recovers_usable_voucher() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::blocked(CannotClaimReason::OutOfStock))
            .with_vouchers(vec![voucher("REC789", "555444333", Some(48))]),
    );

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::RecoveredExisting);
    assert_eq!(run.voucher_code.as_deref(), Some("REC789"));
    assert!(run.email_sent);

    let state = h.stored_state().unwrap();
    assert_eq!(state.voucher_code, "REC789");
    assert!(state.expires_at > state.claimed_at);
    assert_eq!(h.loyalty.claim_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test]
async fn claim_cap_with_empty_listing_is_anomalous() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::blocked(
        CannotClaimReason::MaxClaimsPerPeriodReached,
    )));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::MaxClaimsNoVoucher);
    assert!(!run.outcome.is_retryable());
}

#[tokio::test]
async fn claim_cap_with_expired_voucher_discards_it() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::blocked(
            CannotClaimReason::MaxClaimsPerPeriodReached,
        ))
        .with_vouchers(vec![voucher("GONE11", "000111222", Some(-24))]),
    );

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::VoucherExpired);
    assert!(h.stored_state().is_none());
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn out_of_stock_with_expired_voucher_stays_out_of_stock() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::blocked(CannotClaimReason::OutOfStock))
            .with_vouchers(vec![voucher("GONE11", "000111222", Some(-24))]),
    );

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::OutOfStock);
    assert!(h.stored_state().is_none());
}

#[tokio::test]
async fn unknown_block_reason_is_preserved() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::blocked(
        CannotClaimReason::Other("ACCOUNT_SUSPENDED".to_string()),
    )));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(
        run.outcome,
        ReconcileOutcome::CannotClaim("ACCOUNT_SUSPENDED".to_string())
    );
    assert_eq!(h.loyalty.list_calls.load(Ordering::SeqCst), 0);
}

// ---- recovery vs the email flag ----------------------------------------------

#[tokio::test]
async fn recovery_of_already_emailed_code_does_not_resend() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::blocked(
            CannotClaimReason::MaxClaimsPerPeriodReached,
        ))
        .with_vouchers(vec![voucher("SAME01", "999888777", Some(72))]),
    );
    // Stale local record for the same code, already emailed.
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("SAME01", -1, true));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::RecoveredExisting);
    assert!(run.email_sent);

    // The flag never regresses and the email never repeats for one code.
    assert!(h.stored_state().unwrap().email_sent);
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn recovery_of_new_code_after_stale_state_sends() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::blocked(
            CannotClaimReason::MaxClaimsPerPeriodReached,
        ))
        .with_vouchers(vec![voucher("NEW202", "444555666", Some(72))]),
    );
    h.store
        .rows
        .insert(ACCOUNT_NUMBER.to_string(), stored_state("OLD101", -1, true));

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::RecoveredExisting);

    let state = h.stored_state().unwrap();
    assert_eq!(state.voucher_code, "NEW202");
    assert!(state.email_sent);
    assert_eq!(
        h.sent(),
        vec![(ACCOUNT_NUMBER.to_string(), "NEW202".to_string())]
    );
}

// ---- failure handling ---------------------------------------------------------

#[tokio::test]
async fn state_write_failure_after_claim_still_reports_claimed() {
    let h = Harness::new(
        MockLoyaltyApi::new(OfferStatus::claimable())
            .with_claim("reward-1")
            .with_vouchers(vec![voucher("ABC123", "999888777", Some(24 * 14))]),
    );
    h.store.fail_puts.store(true, Ordering::SeqCst);

    let run = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap();
    assert_eq!(run.outcome, ReconcileOutcome::Claimed);
    assert!(!run.email_sent);

    // Nothing durable, nothing sent; next period's run re-claims or recovers.
    assert!(h.stored_state().is_none());
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn state_read_failure_is_fatal() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()));
    h.store.fail_gets.store(true, Ordering::SeqCst);

    let err = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert_eq!(h.loyalty.offer_status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_failure_propagates() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()).failing());

    let err = h.reconciler.reconcile(ACCOUNT_ID).await.unwrap_err();
    assert!(matches!(err, Error::Remote(_)));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_remote_call() {
    let h = Harness::new(MockLoyaltyApi::new(OfferStatus::claimable()));

    let err = h.reconciler.reconcile("acct-ghost").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(h.loyalty.offer_status_calls.load(Ordering::SeqCst), 0);
}
