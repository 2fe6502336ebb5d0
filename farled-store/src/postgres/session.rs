use async_trait::async_trait;
use chrono::{DateTime, Utc};
use farled_core::session::{ClaimSession, ClaimSessionStatus};
use farled_core::store::{BoxError, SessionOps};
use uuid::Uuid;

use super::PgTx;

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    token: Uuid,
    sailing_id: Uuid,
    status: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for ClaimSession {
    type Error = BoxError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(ClaimSession {
            id: row.id,
            token: row.token,
            sailing_id: row.sailing_id,
            status: row.status.parse::<ClaimSessionStatus>()?,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, token, sailing_id, status, expires_at, created_at, updated_at";

#[async_trait]
impl SessionOps for PgTx {
    async fn insert_session(&mut self, session: &ClaimSession) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO claim_session (id, token, sailing_id, status, expires_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.token)
        .bind(session.sailing_id)
        .bind(session.status.as_str())
        .bind(session.expires_at)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn session_by_token(&mut self, token: Uuid) -> Result<Option<ClaimSession>, BoxError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM claim_session WHERE token = $1",
        ))
        .bind(token)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(ClaimSession::try_from).transpose()
    }

    async fn session_by_token_for_update(
        &mut self,
        token: Uuid,
    ) -> Result<Option<ClaimSession>, BoxError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM claim_session WHERE token = $1 FOR UPDATE",
        ))
        .bind(token)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(ClaimSession::try_from).transpose()
    }

    async fn session_by_id(&mut self, id: Uuid) -> Result<Option<ClaimSession>, BoxError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM claim_session WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(ClaimSession::try_from).transpose()
    }

    async fn update_session(&mut self, session: &ClaimSession) -> Result<(), BoxError> {
        sqlx::query(
            "UPDATE claim_session SET status = $2, expires_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.status.as_str())
        .bind(session.expires_at)
        .bind(session.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_session(&mut self, id: Uuid) -> Result<(), BoxError> {
        sqlx::query("DELETE FROM claim_session WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn expired_sessions(
        &mut self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClaimSession>, BoxError> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM claim_session \
             WHERE (expires_at <= $1 AND status IN ('PENDING_DATA', 'PENDING_PAYMENT')) \
                OR status = 'EXPIRED' \
             ORDER BY expires_at LIMIT $2",
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(ClaimSession::try_from).collect()
    }
}
