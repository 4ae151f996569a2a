// src/repositories/postgres/mod.rs

pub mod account_credentials;
pub mod app_config;
pub mod claim_state;

pub use account_credentials::PostgresAccountCredentialsRepository;
pub use app_config::PostgresAppConfigRepository;
pub use claim_state::PostgresClaimStateRepository;
