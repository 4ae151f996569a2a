// File: brewbot-core/src/services/trigger.rs

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use brewbot_common::models::trigger::{TriggerEvent, TriggerReport, TriggerResponse};
use crate::services::reconciler::ClaimReconciler;

/// Adapts one external trigger event into one reconcile pass and maps the
/// result onto a transport-shaped response. Infallible by construction:
/// every failure becomes a 500-with-body, never a panic or a bare error.
pub struct TriggerHandler {
    reconciler: Arc<ClaimReconciler>,
}

impl TriggerHandler {
    pub fn new(reconciler: Arc<ClaimReconciler>) -> Self {
        Self { reconciler }
    }

    pub async fn handle(&self, event: TriggerEvent) -> TriggerResponse {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!("trigger {request_id} => account '{}'", event.account_id);

        let result = self.reconciler.reconcile(&event.account_id).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(run) => {
                info!(
                    "trigger {request_id} => account '{}' outcome '{}' in {duration_ms}ms",
                    event.account_id,
                    run.outcome.action()
                );
                let failed = run.outcome.is_execution_failure();
                let report = TriggerReport {
                    success: !failed,
                    action: run.outcome.action().to_string(),
                    account_number: Some(run.account_number),
                    voucher_code: run.voucher_code,
                    email_sent: run.email_sent,
                    error: failed.then(|| {
                        "claim succeeded but no voucher appeared in the listing".to_string()
                    }),
                    duration_ms,
                    timestamp: Utc::now(),
                    request_id,
                };
                if failed {
                    TriggerResponse::internal_error(report)
                } else {
                    TriggerResponse::ok(report)
                }
            }
            Err(e) => {
                error!(
                    "trigger {request_id} => account '{}' failed: {e}",
                    event.account_id
                );
                TriggerResponse::internal_error(TriggerReport {
                    success: false,
                    action: "error".to_string(),
                    account_number: None,
                    voucher_code: None,
                    email_sent: false,
                    error: Some(format!("account '{}': {e}", event.account_id)),
                    duration_ms,
                    timestamp: Utc::now(),
                    request_id,
                })
            }
        }
    }
}
