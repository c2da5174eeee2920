use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use meetline_core::domain::interaction::{Interaction, InteractionId, InteractionStatus, Metadata};
use meetline_core::domain::user::UserId;

use super::{InteractionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InteractionRepository for SqlInteractionRepository {
    async fn find_by_id(
        &self,
        id: &InteractionId,
    ) -> Result<Option<Interaction>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                requester_id,
                approver_id,
                status,
                metadata,
                created_at
             FROM interactions
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(interaction_from_row).transpose()
    }

    async fn find_by_requester_id(
        &self,
        requester_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                requester_id,
                approver_id,
                status,
                metadata,
                created_at
             FROM interactions
             WHERE requester_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(&requester_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(interaction_from_row).collect()
    }

    async fn find_by_approver_id(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                requester_id,
                approver_id,
                status,
                metadata,
                created_at
             FROM interactions
             WHERE approver_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(&approver_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(interaction_from_row).collect()
    }

    async fn save(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO interactions (
                id,
                requester_id,
                approver_id,
                status,
                metadata,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&interaction.id.0)
        .bind(&interaction.requester_id.0)
        .bind(&interaction.approver_id.0)
        .bind(interaction.status.as_str())
        .bind(encode_metadata(interaction.metadata.as_ref())?)
        .bind(interaction.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, interaction: Interaction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO interactions (
                id,
                requester_id,
                approver_id,
                status,
                metadata,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                requester_id = excluded.requester_id,
                approver_id = excluded.approver_id,
                status = excluded.status,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
        )
        .bind(&interaction.id.0)
        .bind(&interaction.requester_id.0)
        .bind(&interaction.approver_id.0)
        .bind(interaction.status.as_str())
        .bind(encode_metadata(interaction.metadata.as_ref())?)
        .bind(interaction.created_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn encode_metadata(metadata: Option<&Metadata>) -> Result<Option<String>, RepositoryError> {
    metadata
        .map(serde_json::to_string)
        .transpose()
        .map_err(|error| RepositoryError::Decode(format!("could not encode metadata: {error}")))
}

fn interaction_from_row(row: SqliteRow) -> Result<Interaction, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = InteractionStatus::parse(&status_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown interaction status `{status_raw}`"))
    })?;

    let metadata = row
        .try_get::<Option<String>, _>("metadata")?
        .map(|raw| {
            serde_json::from_str::<Metadata>(&raw)
                .map_err(|error| RepositoryError::Decode(format!("invalid metadata json: {error}")))
        })
        .transpose()?;

    Ok(Interaction {
        id: InteractionId(row.try_get("id")?),
        requester_id: UserId(row.try_get("requester_id")?),
        approver_id: UserId(row.try_get("approver_id")?),
        status,
        metadata,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
