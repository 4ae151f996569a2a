// File: brewbot-core/src/services/mod.rs

pub mod reconciler;
pub mod trigger;

pub use reconciler::{ClaimReconciler, ReconcilerPolicy};
pub use trigger::TriggerHandler;
