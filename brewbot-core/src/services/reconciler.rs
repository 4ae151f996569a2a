// File: brewbot-core/src/services/reconciler.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use brewbot_common::models::account::ResolvedAccount;
use brewbot_common::models::claim_state::ClaimState;
use brewbot_common::models::offer::CannotClaimReason;
use brewbot_common::models::outcome::{ReconcileOutcome, ReconcileRun};
use brewbot_common::traits::loyalty_traits::LoyaltyApi;
use brewbot_common::traits::notifier_traits::VoucherNotifier;
use brewbot_common::traits::repository_traits::ClaimStateRepository;
use crate::credentials::CredentialProvider;
use crate::Error;

pub const DEFAULT_OFFER_SLUG: &str = "caffe-nero";
pub const DEFAULT_VOUCHER_PERIOD_DAYS: i64 = 7;

/// Tunables for one reconciler instance.
#[derive(Debug, Clone)]
pub struct ReconcilerPolicy {
    /// Slug of the one promotion this instance claims.
    pub offer_slug: String,
    /// How long a claimed voucher stays fresh before the next claim is due.
    pub voucher_period: Duration,
    /// Resend the email on every run even when the stored flag says it
    /// already went out. Off by default; duplicates are worse than waiting.
    pub force_send: bool,
}

impl Default for ReconcilerPolicy {
    fn default() -> Self {
        Self {
            offer_slug: DEFAULT_OFFER_SLUG.to_string(),
            voucher_period: Duration::days(DEFAULT_VOUCHER_PERIOD_DAYS),
            force_send: false,
        }
    }
}

/// Drives one account through the claim state machine.
///
/// Each call is one complete pass: resolve credentials, consult stored
/// state, and only then talk to the remote service. Every success path
/// persists state before the notification attempt, so a crash mid-pass can
/// lose an email but never a voucher.
pub struct ClaimReconciler {
    credentials: Arc<CredentialProvider>,
    loyalty: Arc<dyn LoyaltyApi>,
    store: Arc<dyn ClaimStateRepository>,
    notifier: Arc<dyn VoucherNotifier>,
    policy: ReconcilerPolicy,
}

impl ClaimReconciler {
    pub fn new(
        credentials: Arc<CredentialProvider>,
        loyalty: Arc<dyn LoyaltyApi>,
        store: Arc<dyn ClaimStateRepository>,
        notifier: Arc<dyn VoucherNotifier>,
        policy: ReconcilerPolicy,
    ) -> Self {
        Self {
            credentials,
            loyalty,
            store,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &ReconcilerPolicy {
        &self.policy
    }

    /// One reconcile pass for `account_id`. Completed passes return a
    /// `ReconcileRun`; credential, remote, and state-read failures return
    /// `Err` and leave recovery to the next invocation.
    pub async fn reconcile(&self, account_id: &str) -> Result<ReconcileRun, Error> {
        let account = self.credentials.resolve(account_id).await?;
        let account_number = account.identity.account_number.clone();
        let now = Utc::now();

        let prior = self.store.get(&account_number).await?;
        if let Some(state) = &prior {
            if state.is_fresh(now) {
                if state.email_sent && !self.policy.force_send {
                    debug!(
                        "account '{}' holds fresh voucher '{}' already emailed => skip",
                        account_number, state.voucher_code
                    );
                    return Ok(ReconcileRun::new(ReconcileOutcome::Skip, &account_number)
                        .with_voucher(&state.voucher_code)
                        .with_email_sent(true));
                }
                return self.notify_stored(&account, state.clone()).await;
            }
            debug!(
                "account '{}' voucher '{}' went stale at {} => claiming again",
                account_number, state.voucher_code, state.expires_at
            );
        }

        let status = self
            .loyalty
            .offer_status(&account.identity, &self.policy.offer_slug)
            .await?;

        if !status.found {
            warn!(
                "offer '{}' is not in account '{}' catalog",
                self.policy.offer_slug, account_number
            );
            return Ok(ReconcileRun::new(
                ReconcileOutcome::OfferNotFound,
                &account_number,
            ));
        }

        if status.can_claim {
            return self.claim_fresh(&account, now).await;
        }

        match status.cannot_claim_reason {
            Some(CannotClaimReason::OutOfStock) => {
                self.recover_existing(&account, prior.as_ref(), now, true).await
            }
            Some(CannotClaimReason::MaxClaimsPerPeriodReached) => {
                self.recover_existing(&account, prior.as_ref(), now, false).await
            }
            Some(CannotClaimReason::Other(reason)) => {
                warn!(
                    "offer '{}' blocked for account '{}' with unexpected reason '{}'",
                    self.policy.offer_slug, account_number, reason
                );
                Ok(ReconcileRun::new(
                    ReconcileOutcome::CannotClaim(reason),
                    &account_number,
                ))
            }
            None => {
                warn!(
                    "offer '{}' not claimable for account '{}' and no reason given",
                    self.policy.offer_slug, account_number
                );
                Ok(ReconcileRun::new(
                    ReconcileOutcome::CannotClaim("UNSPECIFIED".to_string()),
                    &account_number,
                ))
            }
        }
    }

    /// Fresh stored voucher whose email has not gone out yet (or is being
    /// force-resent). No new claim; the stored fields are what we deliver.
    /// The flag write precedes the send, so a crash in between costs one
    /// email, never a duplicate.
    async fn notify_stored(
        &self,
        account: &ResolvedAccount,
        mut state: ClaimState,
    ) -> Result<ReconcileRun, Error> {
        let account_number = state.account_number.clone();

        if !state.email_sent {
            state.email_sent = true;
            self.store.put(&state).await?;
        }

        if let Err(e) = self.notifier.send_voucher(account, &state).await {
            warn!("notification failed for account '{}': {e}", account_number);
        }

        Ok(
            ReconcileRun::new(ReconcileOutcome::EmailSent, &account_number)
                .with_voucher(&state.voucher_code)
                .with_email_sent(true),
        )
    }

    /// Offer is claimable: claim it, then pull the newest voucher off the
    /// listing since the claim call itself returns no code or barcode.
    async fn claim_fresh(
        &self,
        account: &ResolvedAccount,
        now: DateTime<Utc>,
    ) -> Result<ReconcileRun, Error> {
        let account_number = account.identity.account_number.clone();

        let reward = self
            .loyalty
            .claim_offer(&account.identity, &self.policy.offer_slug)
            .await?;
        info!(
            "claimed offer '{}' for account '{}' => reward '{}'",
            self.policy.offer_slug, account_number, reward.reward_id
        );

        let vouchers = self
            .loyalty
            .claimed_vouchers(&account.identity, &self.policy.offer_slug)
            .await?;

        let Some(voucher) = vouchers.into_iter().next() else {
            error!(
                "claim succeeded for account '{}' but the voucher listing is empty",
                account_number
            );
            return Ok(ReconcileRun::new(
                ReconcileOutcome::ClaimSucceededButVoucherMissing,
                &account_number,
            ));
        };

        let state = ClaimState::fresh_claim(&voucher, now, self.policy.voucher_period);
        let email_sent = self.persist_then_notify(account, state).await;

        Ok(
            ReconcileRun::new(ReconcileOutcome::Claimed, &account_number)
                .with_voucher(&voucher.code)
                .with_email_sent(email_sent),
        )
    }

    /// The claim window is shut (`out_of_stock` distinguishes stock from the
    /// per-period cap), which can also mean this account already claimed
    /// through a channel we never saw. Adopt the newest usable voucher from
    /// the listing when there is one.
    async fn recover_existing(
        &self,
        account: &ResolvedAccount,
        prior: Option<&ClaimState>,
        now: DateTime<Utc>,
        out_of_stock: bool,
    ) -> Result<ReconcileRun, Error> {
        let account_number = account.identity.account_number.clone();

        let vouchers = self
            .loyalty
            .claimed_vouchers(&account.identity, &self.policy.offer_slug)
            .await?;

        let Some(voucher) = vouchers.into_iter().next() else {
            return Ok(if out_of_stock {
                info!(
                    "offer out of stock for account '{}' and nothing to recover => retry later",
                    account_number
                );
                ReconcileRun::new(ReconcileOutcome::OutOfStock, &account_number)
            } else {
                warn!(
                    "claim cap reached for account '{}' yet its voucher listing is empty",
                    account_number
                );
                ReconcileRun::new(ReconcileOutcome::MaxClaimsNoVoucher, &account_number)
            });
        };

        if !voucher.is_usable(now) {
            debug!(
                "newest voucher '{}' for account '{}' already expired => discarding",
                voucher.code, account_number
            );
            return Ok(if out_of_stock {
                ReconcileRun::new(ReconcileOutcome::OutOfStock, &account_number)
            } else {
                ReconcileRun::new(ReconcileOutcome::VoucherExpired, &account_number)
            });
        }

        info!(
            "recovered existing voucher '{}' for account '{}'",
            voucher.code, account_number
        );
        let mut state = ClaimState::recovered(&voucher, now, self.policy.voucher_period);

        // The same code may already have been emailed from a prior, now
        // stale, record. The flag never regresses and the email never
        // repeats for an unchanged code.
        let already_emailed = prior
            .map(|p| p.voucher_code == voucher.code && p.email_sent)
            .unwrap_or(false);
        if already_emailed && !self.policy.force_send {
            state.email_sent = true;
            if let Err(e) = self.store.put(&state).await {
                warn!(
                    "state write failed for account '{}' while refreshing voucher '{}': {e}",
                    account_number, state.voucher_code
                );
            }
            return Ok(ReconcileRun::new(
                ReconcileOutcome::RecoveredExisting,
                &account_number,
            )
            .with_voucher(&state.voucher_code)
            .with_email_sent(true));
        }

        let email_sent = self.persist_then_notify(account, state).await;
        Ok(ReconcileRun::new(
            ReconcileOutcome::RecoveredExisting,
            &account_number,
        )
        .with_voucher(&voucher.code)
        .with_email_sent(email_sent))
    }

    /// Persist newly obtained state, then mark and send. Write failures are
    /// logged, not propagated: the voucher already exists remotely, and next
    /// run's recovery path picks it back up. The send only happens once the
    /// marked row is durable, which keeps delivery at most once per code.
    /// Returns whether the stored email flag ended up set.
    async fn persist_then_notify(&self, account: &ResolvedAccount, mut state: ClaimState) -> bool {
        if let Err(e) = self.store.put(&state).await {
            warn!(
                "state write failed for account '{}' after obtaining voucher '{}': {e}; skipping notification",
                state.account_number, state.voucher_code
            );
            return false;
        }

        state.email_sent = true;
        if let Err(e) = self.store.put(&state).await {
            warn!(
                "could not mark email flag for account '{}' voucher '{}': {e}; skipping notification",
                state.account_number, state.voucher_code
            );
            return false;
        }

        if let Err(e) = self.notifier.send_voucher(account, &state).await {
            warn!(
                "notification failed for account '{}': {e}",
                state.account_number
            );
        }
        true
    }
}
