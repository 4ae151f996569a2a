// src/repositories/postgres/claim_state.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use brewbot_common::models::claim_state::ClaimState;
use brewbot_common::traits::repository_traits::ClaimStateRepository;
use crate::Error;

#[derive(Clone)]
pub struct PostgresClaimStateRepository {
    pool: Pool<Postgres>,
}

impl PostgresClaimStateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimStateRepository for PostgresClaimStateRepository {
    async fn get(&self, account_number: &str) -> Result<Option<ClaimState>, Error> {
        let row = sqlx::query_as::<_, ClaimState>(
            r#"
            SELECT account_number,
                   voucher_code,
                   barcode,
                   expires_at,
                   claimed_at,
                   email_sent,
                   ttl_at
            FROM claim_state
            WHERE account_number = $1
            "#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn put(&self, state: &ClaimState) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO claim_state (
                account_number,
                voucher_code,
                barcode,
                expires_at,
                claimed_at,
                email_sent,
                ttl_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (account_number) DO UPDATE
               SET voucher_code = EXCLUDED.voucher_code,
                   barcode      = EXCLUDED.barcode,
                   expires_at   = EXCLUDED.expires_at,
                   claimed_at   = EXCLUDED.claimed_at,
                   email_sent   = EXCLUDED.email_sent,
                   ttl_at       = EXCLUDED.ttl_at
            "#,
        )
        .bind(&state.account_number)
        .bind(&state.voucher_code)
        .bind(&state.barcode)
        .bind(state.expires_at)
        .bind(state.claimed_at)
        .bind(state.email_sent)
        .bind(state.ttl_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, account_number: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            DELETE FROM claim_state
            WHERE account_number = $1
            "#,
        )
        .bind(account_number)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM claim_state
            WHERE ttl_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
