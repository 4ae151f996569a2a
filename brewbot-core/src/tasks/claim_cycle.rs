// src/tasks/claim_cycle.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use brewbot_common::models::trigger::TriggerEvent;
use crate::credentials::CredentialProvider;
use crate::services::trigger::TriggerHandler;
use crate::Error;

/// Spawns the built-in scheduler: one sweep over every configured account on
/// a fixed cadence. Each account goes through the same handler an external
/// trigger would hit, so outcomes and retry semantics are identical.
pub fn spawn_claim_cycle_task(
    handler: Arc<TriggerHandler>,
    credentials: Arc<CredentialProvider>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = run_claim_cycle(&handler, &credentials).await {
                error!("Claim cycle failed: {:?}", e);
            }
        }
    })
}

/// One sweep: every account independently, failures logged and counted but
/// never short-circuiting the rest.
pub async fn run_claim_cycle(
    handler: &TriggerHandler,
    credentials: &CredentialProvider,
) -> Result<(), Error> {
    let account_ids = credentials.list_account_ids().await?;
    if account_ids.is_empty() {
        info!("No accounts configured; nothing to reconcile.");
        return Ok(());
    }

    info!("Running claim cycle for {} account(s)...", account_ids.len());
    let mut failures = 0usize;
    for account_id in account_ids {
        let response = handler
            .handle(TriggerEvent {
                account_id: account_id.clone(),
            })
            .await;
        if response.status != 200 {
            failures += 1;
        }
    }

    if failures > 0 {
        warn!("Claim cycle finished with {} failed account(s).", failures);
    } else {
        info!("Claim cycle complete.");
    }
    Ok(())
}
