// src/lib.rs

pub mod credentials;
pub mod crypto;
pub mod db;
pub mod notifier;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;

pub use brewbot_common::error::Error;
pub use db::Database;
