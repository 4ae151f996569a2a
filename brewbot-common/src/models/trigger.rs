// File: brewbot-common/src/models/trigger.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound trigger payload naming the account to reconcile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub account_id: String,
}

/// Body returned for every trigger invocation, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReport {
    pub success: bool,
    /// Outcome action tag, or "error" when the run never completed.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
}

/// Status code plus report body, ready for whatever transport delivered the
/// trigger.
#[derive(Debug, Clone)]
pub struct TriggerResponse {
    pub status: u16,
    pub body: TriggerReport,
}

impl TriggerResponse {
    pub fn ok(body: TriggerReport) -> Self {
        TriggerResponse { status: 200, body }
    }

    pub fn internal_error(body: TriggerReport) -> Self {
        TriggerResponse { status: 500, body }
    }
}
