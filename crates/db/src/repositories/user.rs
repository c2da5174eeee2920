use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use meetline_core::domain::user::{LineUserId, User, UserId};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                line_user_id,
                display_name,
                wallet_address
             FROM users
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn find_by_line_user_id(
        &self,
        line_user_id: &LineUserId,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                line_user_id,
                display_name,
                wallet_address
             FROM users
             WHERE line_user_id = ?",
        )
        .bind(&line_user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (
                id,
                line_user_id,
                display_name,
                wallet_address,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id.0)
        .bind(&user.line_user_id.0)
        .bind(&user.display_name)
        .bind(user.wallet_address.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, user: User) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (
                id,
                line_user_id,
                display_name,
                wallet_address,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                line_user_id = excluded.line_user_id,
                display_name = excluded.display_name,
                wallet_address = excluded.wallet_address,
                updated_at = excluded.updated_at",
        )
        .bind(&user.id.0)
        .bind(&user.line_user_id.0)
        .bind(&user.display_name)
        .bind(user.wallet_address.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn user_from_row(row: SqliteRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        line_user_id: LineUserId(row.try_get("line_user_id")?),
        display_name: row.try_get("display_name")?,
        wallet_address: row.try_get("wallet_address")?,
    })
}
