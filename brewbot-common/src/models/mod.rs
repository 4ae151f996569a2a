// File: brewbot-common/src/models/mod.rs
pub mod account;
pub mod claim_state;
pub mod offer;
pub mod outcome;
pub mod trigger;
pub mod voucher;

pub use account::{AccountIdentity, CredentialRecord, ResolvedAccount};
pub use claim_state::ClaimState;
pub use offer::{CannotClaimReason, OfferStatus};
pub use outcome::{ReconcileOutcome, ReconcileRun};
pub use trigger::{TriggerEvent, TriggerReport, TriggerResponse};
pub use voucher::{ClaimedReward, Voucher};
