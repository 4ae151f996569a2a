//! brewbot-server/src/context.rs
//!
//! Builds the wired-up service graph for the server binary.

use std::sync::Arc;

use tracing::{info, warn};

use brewbot_common::traits::repository_traits::{AppConfigRepository, ClaimStateRepository};
use brewbot_core::credentials::CredentialProvider;
use brewbot_core::crypto::Encryptor;
use brewbot_core::db::Database;
use brewbot_core::notifier::{EmailNotifier, DEFAULT_MAIL_API_URL};
use brewbot_core::platforms::octoplus::{OctoplusClient, DEFAULT_ENDPOINT};
use brewbot_core::repositories::postgres::{
    PostgresAccountCredentialsRepository, PostgresAppConfigRepository,
    PostgresClaimStateRepository,
};
use brewbot_core::services::{ClaimReconciler, ReconcilerPolicy, TriggerHandler};
use brewbot_core::services::reconciler::DEFAULT_VOUCHER_PERIOD_DAYS;
use brewbot_core::Error;

use crate::Args;

const ENCRYPTION_KEY_ENV: &str = "BREWBOT_ENCRYPTION_KEY";
const OCTOPLUS_ENDPOINT_ENV: &str = "BREWBOT_OCTOPLUS_ENDPOINT";
const MAIL_API_URL_ENV: &str = "BREWBOT_MAIL_API_URL";
const MAIL_API_KEY_ENV: &str = "BREWBOT_MAIL_API_KEY";
const MAIL_FROM_ENV: &str = "BREWBOT_MAIL_FROM";

/// Everything the server binary holds onto after startup wiring.
pub struct ServerContext {
    pub db: Database,
    pub credentials: Arc<CredentialProvider>,
    pub store: Arc<dyn ClaimStateRepository>,
    pub trigger_handler: Arc<TriggerHandler>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        info!("Using Postgres DB URL: {}", args.db_url);
        let db = Database::new(&args.db_url).await?;
        db.migrate().await?;

        let key = std::env::var(ENCRYPTION_KEY_ENV).map_err(|_| {
            Error::Config(format!(
                "{ENCRYPTION_KEY_ENV} must hold a base64-encoded 32-byte key"
            ))
        })?;
        let encryptor = Encryptor::from_base64_key(&key)?;

        let creds_repo = Arc::new(PostgresAccountCredentialsRepository::new(
            db.pool().clone(),
            encryptor,
        ));
        let store: Arc<dyn ClaimStateRepository> =
            Arc::new(PostgresClaimStateRepository::new(db.pool().clone()));
        let app_config = PostgresAppConfigRepository::new(db.pool().clone());

        let credentials = Arc::new(CredentialProvider::new(creds_repo));

        let endpoint = std::env::var(OCTOPLUS_ENDPOINT_ENV)
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let loyalty = Arc::new(OctoplusClient::new(&endpoint));

        let mail_api_key = std::env::var(MAIL_API_KEY_ENV).map_err(|_| {
            Error::Config(format!("{MAIL_API_KEY_ENV} must be set to send voucher emails"))
        })?;
        let mail_api_url =
            std::env::var(MAIL_API_URL_ENV).unwrap_or_else(|_| DEFAULT_MAIL_API_URL.to_string());
        let mail_from = std::env::var(MAIL_FROM_ENV)
            .unwrap_or_else(|_| "brewbot@localhost".to_string());
        let notifier = Arc::new(EmailNotifier::new(&mail_api_url, &mail_api_key, &mail_from));

        let policy = load_policy(&app_config).await?;
        info!(
            "Reconciler policy: slug='{}' period={}d force_send={}",
            policy.offer_slug,
            policy.voucher_period.num_days(),
            policy.force_send
        );

        let reconciler = Arc::new(ClaimReconciler::new(
            credentials.clone(),
            loyalty,
            store.clone(),
            notifier,
            policy,
        ));
        let trigger_handler = Arc::new(TriggerHandler::new(reconciler));

        Ok(Self {
            db,
            credentials,
            store,
            trigger_handler,
        })
    }
}

/// Runtime-tunable policy keys, falling back to defaults when unset or
/// unparsable (a bad value is logged, never fatal).
async fn load_policy(app_config: &PostgresAppConfigRepository) -> Result<ReconcilerPolicy, Error> {
    let mut policy = ReconcilerPolicy::default();

    if let Some(slug) = app_config.get_value("offer_slug").await? {
        policy.offer_slug = slug;
    }
    if let Some(days) = app_config.get_value("voucher_period_days").await? {
        match days.parse::<i64>() {
            Ok(d) if d > 0 => policy.voucher_period = chrono::Duration::days(d),
            _ => warn!(
                "Ignoring voucher_period_days='{}'; keeping {} days",
                days, DEFAULT_VOUCHER_PERIOD_DAYS
            ),
        }
    }
    if let Some(force) = app_config.get_value("force_send").await? {
        match force.parse::<bool>() {
            Ok(f) => policy.force_send = f,
            Err(_) => warn!("Ignoring force_send='{}'; keeping false", force),
        }
    }

    Ok(policy)
}
