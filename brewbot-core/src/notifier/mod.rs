// File: brewbot-core/src/notifier/mod.rs

pub mod mailer;
pub mod qr;

pub use mailer::{EmailNotifier, DEFAULT_MAIL_API_URL};
