// File: brewbot-common/src/traits/mod.rs
pub mod loyalty_traits;
pub mod notifier_traits;
pub mod repository_traits;
