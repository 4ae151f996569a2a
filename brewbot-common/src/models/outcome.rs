// File: brewbot-common/src/models/outcome.rs

use serde::{Deserialize, Serialize};

/// Terminal outcome of one reconcile pass for one account.
///
/// Every variant is a completed run; remote, database read, and
/// configuration failures surface as errors instead, never as an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// A fresh voucher is already stored and its email already went out.
    Skip,
    /// A fresh voucher was already stored with the email still pending; the
    /// email went out (or was attempted) on this pass.
    EmailSent,
    /// A new voucher was claimed on this pass.
    Claimed,
    /// No fresh local state, but the account already held a usable voucher
    /// remotely; it was adopted instead of claiming a new one.
    RecoveredExisting,
    /// The offer is not in the account's catalog at all.
    OfferNotFound,
    /// The offer is out of stock and the account holds no usable voucher.
    OutOfStock,
    /// The account hit the per-period claim cap yet no voucher shows up in
    /// its listing. Anomalous but observed.
    MaxClaimsNoVoucher,
    /// The claim cap is reached and the only voucher on record has already
    /// expired.
    VoucherExpired,
    /// The offer exists but cannot be claimed for a reason other than stock
    /// or the claim cap. Carries the raw reason string.
    CannotClaim(String),
    /// The claim mutation succeeded but no voucher appeared in the listing
    /// afterwards. The one completed outcome reported as a failure.
    ClaimSucceededButVoucherMissing,
}

impl ReconcileOutcome {
    /// Short machine-readable tag for logs and trigger responses.
    pub fn action(&self) -> &'static str {
        match self {
            ReconcileOutcome::Skip => "skip",
            ReconcileOutcome::EmailSent => "email_sent",
            ReconcileOutcome::Claimed => "claimed",
            ReconcileOutcome::RecoveredExisting => "recovered_existing",
            ReconcileOutcome::OfferNotFound => "offer_not_found",
            ReconcileOutcome::OutOfStock => "out_of_stock",
            ReconcileOutcome::MaxClaimsNoVoucher => "max_claims_no_voucher",
            ReconcileOutcome::VoucherExpired => "voucher_expired",
            ReconcileOutcome::CannotClaim(_) => "cannot_claim",
            ReconcileOutcome::ClaimSucceededButVoucherMissing => {
                "claim_succeeded_but_voucher_missing"
            }
        }
    }

    /// Whether re-invoking soon could plausibly do better. Stock can come
    /// back within the claim window and the missing-voucher inconsistency
    /// can heal; the claim cap and an unknown block reason will not budge
    /// until the next period.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::OutOfStock | ReconcileOutcome::ClaimSucceededButVoucherMissing
        )
    }

    /// True only for claim-succeeded-voucher-vanished, which is reported as
    /// a failure even though the pass ran to completion.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, ReconcileOutcome::ClaimSucceededButVoucherMissing)
    }
}

/// Outcome of a pass plus the identifiers a caller needs to report on it.
#[derive(Debug, Clone)]
pub struct ReconcileRun {
    pub outcome: ReconcileOutcome,
    pub account_number: String,
    pub voucher_code: Option<String>,
    /// Whether the stored state now has its email flag set.
    pub email_sent: bool,
}

impl ReconcileRun {
    pub fn new(outcome: ReconcileOutcome, account_number: impl Into<String>) -> Self {
        ReconcileRun {
            outcome,
            account_number: account_number.into(),
            voucher_code: None,
            email_sent: false,
        }
    }

    pub fn with_voucher(mut self, code: impl Into<String>) -> Self {
        self.voucher_code = Some(code.into());
        self
    }

    pub fn with_email_sent(mut self, sent: bool) -> Self {
        self.email_sent = sent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tags_are_stable() {
        assert_eq!(ReconcileOutcome::Skip.action(), "skip");
        assert_eq!(ReconcileOutcome::Claimed.action(), "claimed");
        assert_eq!(
            ReconcileOutcome::CannotClaim("ACCOUNT_SUSPENDED".into()).action(),
            "cannot_claim"
        );
        assert_eq!(
            ReconcileOutcome::ClaimSucceededButVoucherMissing.action(),
            "claim_succeeded_but_voucher_missing"
        );
    }

    #[test]
    fn only_missing_voucher_is_an_execution_failure() {
        assert!(ReconcileOutcome::ClaimSucceededButVoucherMissing.is_execution_failure());
        assert!(!ReconcileOutcome::Skip.is_execution_failure());
        assert!(!ReconcileOutcome::OfferNotFound.is_execution_failure());
        assert!(!ReconcileOutcome::CannotClaim("X".into()).is_execution_failure());
    }

    #[test]
    fn retry_hints() {
        assert!(ReconcileOutcome::OutOfStock.is_retryable());
        assert!(ReconcileOutcome::ClaimSucceededButVoucherMissing.is_retryable());
        assert!(!ReconcileOutcome::MaxClaimsNoVoucher.is_retryable());
        assert!(!ReconcileOutcome::VoucherExpired.is_retryable());
        assert!(!ReconcileOutcome::OfferNotFound.is_retryable());
    }
}
