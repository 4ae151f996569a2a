// File: brewbot-common/src/traits/notifier_traits.rs

use async_trait::async_trait;

use crate::error::Error;
use crate::models::account::ResolvedAccount;
use crate::models::claim_state::ClaimState;

/// Delivery of a claimed voucher to an account's notification addresses.
///
/// Implementations report failures as `Error::Notification`; callers treat
/// delivery as best-effort and never let it fail a reconcile pass.
#[async_trait]
pub trait VoucherNotifier: Send + Sync {
    async fn send_voucher(&self, account: &ResolvedAccount, state: &ClaimState)
        -> Result<(), Error>;
}
