// File: brewbot-core/src/notifier/mailer.rs

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use tracing::{debug, warn};

use brewbot_common::models::account::ResolvedAccount;
use brewbot_common::models::claim_state::ClaimState;
use brewbot_common::traits::notifier_traits::VoucherNotifier;
use crate::notifier::qr::render_qr_png;
use crate::Error;

pub const DEFAULT_MAIL_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

const QR_CONTENT_ID: &str = "voucher-qr";

#[derive(Debug, Serialize)]
struct MailMessage {
    personalizations: Vec<Personalization>,
    from: MailAddress,
    subject: String,
    content: Vec<MailContent>,
    attachments: Vec<MailAttachment>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<MailAddress>,
}

#[derive(Debug, Serialize)]
struct MailAddress {
    email: String,
}

#[derive(Debug, Serialize)]
struct MailContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct MailAttachment {
    content: String,
    #[serde(rename = "type")]
    content_type: String,
    filename: String,
    disposition: String,
    content_id: String,
}

/// Emails a claimed voucher: one message per run, all recipients on the one
/// send, QR image inline.
pub struct EmailNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(api_url: &str, api_key: &str, from_address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from_address: from_address.to_string(),
        }
    }

    fn build_message(&self, account: &ResolvedAccount, state: &ClaimState, qr_png: &[u8]) -> MailMessage {
        let recipients = account
            .notify_addresses
            .iter()
            .map(|email| MailAddress {
                email: email.clone(),
            })
            .collect::<Vec<_>>();

        let greeting = account.nickname.as_deref().unwrap_or("there");
        let expiry = state.expires_at.format("%-d %B %Y");
        let html = format!(
            "<p>Hi {greeting},</p>\
             <p>Your coffee voucher is ready. Show the QR code below, or quote \
             <strong>{code}</strong> at the till.</p>\
             <p><img src=\"cid:{QR_CONTENT_ID}\" alt=\"voucher QR code\"/></p>\
             <p>Valid until {expiry}.</p>",
            code = state.voucher_code,
        );

        MailMessage {
            personalizations: vec![Personalization { to: recipients }],
            from: MailAddress {
                email: self.from_address.clone(),
            },
            subject: format!("Your coffee voucher {}", state.voucher_code),
            content: vec![MailContent {
                content_type: "text/html".to_string(),
                value: html,
            }],
            attachments: vec![MailAttachment {
                content: BASE64.encode(qr_png),
                content_type: "image/png".to_string(),
                filename: "voucher-qr.png".to_string(),
                disposition: "inline".to_string(),
                content_id: QR_CONTENT_ID.to_string(),
            }],
        }
    }
}

#[async_trait]
impl VoucherNotifier for EmailNotifier {
    async fn send_voucher(
        &self,
        account: &ResolvedAccount,
        state: &ClaimState,
    ) -> Result<(), Error> {
        if account.notify_addresses.is_empty() {
            warn!(
                "no valid notification addresses for account '{}', nothing to send",
                account.identity.account_id
            );
            return Ok(());
        }

        let qr_png = render_qr_png(&state.barcode)?;
        let message = self.build_message(account, state, &qr_png);

        let resp = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::Notification(format!("mail request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("mail API => status={} body={}", status, body);
            return Err(Error::Notification(format!(
                "mail API returned HTTP {status}"
            )));
        }

        debug!(
            "voucher email sent => account='{}' recipients={}",
            account.identity.account_number,
            account.notify_addresses.len()
        );
        Ok(())
    }
}
