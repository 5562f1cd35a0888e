use std::future::Future;

use sqlx::postgres::PgPool;
use tracing::{debug, info};

use super::participant::Participant;
use crate::{error::StoreError, phone::Phone};

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn perform_migration_if_needed(&self) -> Result<(), StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'USERS')",
        )
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            info!("USERS table not found, running migrations");
            sqlx::migrate!()
                .run(&self.pool)
                .await
                .map_err(sqlx::Error::from)?;
        }

        Ok(())
    }
}

pub trait FindParticipant {
    fn find_participant(
        &self,
        phone: &Phone,
    ) -> impl Future<Output = Result<Option<Participant>, StoreError>> + Send;
}

pub trait RegisterParticipant {
    /// Inserts `{name, phone}`. A phone the table already holds fails with
    /// [`StoreError::Duplicate`].
    fn register_participant(
        &self,
        name: &str,
        phone: &Phone,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait SaveScore {
    /// Returns the number of rows updated.
    fn save_score(
        &self,
        phone: &Phone,
        score: u32,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

impl FindParticipant for Connection {
    async fn find_participant(&self, phone: &Phone) -> Result<Option<Participant>, StoreError> {
        debug!("Looking up participant {}", phone);
        let participant = sqlx::query_as::<_, Participant>(
            r#"SELECT phone, name, scores FROM "USERS" WHERE phone = $1"#,
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }
}

impl RegisterParticipant for Connection {
    async fn register_participant(&self, name: &str, phone: &Phone) -> Result<(), StoreError> {
        debug!("Inserting participant {}", phone);
        sqlx::query(r#"INSERT INTO "USERS" (name, phone) VALUES ($1, $2)"#)
            .bind(name)
            .bind(phone.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::Duplicate(phone.to_string())
                }
                e => StoreError::Database(e),
            })?;

        Ok(())
    }
}

/// `scores` is an `INTEGER` column.
fn score_column(score: u32) -> Result<i32, StoreError> {
    i32::try_from(score).map_err(|_| StoreError::ScoreOutOfRange(score))
}

impl SaveScore for Connection {
    async fn save_score(&self, phone: &Phone, score: u32) -> Result<u64, StoreError> {
        debug!("Updating score of {} to {}", phone, score);
        let result = sqlx::query(r#"UPDATE "USERS" SET scores = $1 WHERE phone = $2"#)
            .bind(score_column(score)?)
            .bind(phone.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
