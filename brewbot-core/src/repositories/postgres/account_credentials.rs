// src/repositories/postgres/account_credentials.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use brewbot_common::models::account::CredentialRecord;
use brewbot_common::traits::repository_traits::AccountCredentialsRepository;
use crate::crypto::Encryptor;
use crate::Error;

/// Credential records are serialized to JSON and encrypted before they touch
/// the database; plaintext never leaves this repository.
#[derive(Clone)]
pub struct PostgresAccountCredentialsRepository {
    pool: Pool<Postgres>,
    encryptor: Encryptor,
}

impl PostgresAccountCredentialsRepository {
    pub fn new(pool: Pool<Postgres>, encryptor: Encryptor) -> Self {
        Self { pool, encryptor }
    }
}

#[async_trait]
impl AccountCredentialsRepository for PostgresAccountCredentialsRepository {
    async fn store(&self, account_id: &str, record: &CredentialRecord) -> Result<(), Error> {
        let json = serde_json::to_string(record)?;
        let encrypted_record = self.encryptor.encrypt(&json)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO account_credentials (account_id, record, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id) DO UPDATE
               SET record     = EXCLUDED.record,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(account_id)
        .bind(encrypted_record)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, account_id: &str) -> Result<Option<CredentialRecord>, Error> {
        let row = sqlx::query(
            r#"
            SELECT record
            FROM account_credentials
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            let encrypted: String = r.try_get("record")?;
            let json = self.encryptor.decrypt(&encrypted)?;
            let record: CredentialRecord = serde_json::from_str(&json)?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    async fn delete(&self, account_id: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            DELETE FROM account_credentials
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_account_ids(&self) -> Result<Vec<String>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT account_id
            FROM account_credentials
            ORDER BY account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for r in rows {
            ids.push(r.try_get("account_id")?);
        }
        Ok(ids)
    }
}
