// File: brewbot-core/src/platforms/octoplus/requests/mod.rs

pub mod claim;
pub mod offers;
pub mod token;
pub mod vouchers;
