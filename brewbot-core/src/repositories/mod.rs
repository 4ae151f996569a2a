// src/repositories/mod.rs

pub mod postgres;

pub use postgres::account_credentials::PostgresAccountCredentialsRepository;
pub use postgres::app_config::PostgresAppConfigRepository;
pub use postgres::claim_state::PostgresClaimStateRepository;
