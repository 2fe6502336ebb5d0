use async_trait::async_trait;
use farled_core::sailing::CapacityEntry;
use farled_core::store::{BoxError, LedgerOps};
use farled_core::ticket::TicketStatus;
use uuid::Uuid;

use super::PgTx;

#[derive(sqlx::FromRow)]
struct CapacityRow {
    id: Uuid,
    sailing_id: Uuid,
    class_id: Uuid,
    quota: i32,
}

impl From<CapacityRow> for CapacityEntry {
    fn from(row: CapacityRow) -> Self {
        CapacityEntry {
            id: row.id,
            sailing_id: row.sailing_id,
            class_id: row.class_id,
            quota: row.quota,
        }
    }
}

#[async_trait]
impl LedgerOps for PgTx {
    async fn lock_quota(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<i32>, BoxError> {
        // The FOR UPDATE lock is held until this transaction ends; two
        // reservation attempts on the same (sailing, class) serialize here.
        let quota = sqlx::query_scalar::<_, i32>(
            "SELECT quota FROM capacity_ledger \
             WHERE sailing_id = $1 AND class_id = $2 FOR UPDATE",
        )
        .bind(sailing_id)
        .bind(class_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(quota)
    }

    async fn quotas_by_sailing(
        &mut self,
        sailing_id: Uuid,
    ) -> Result<Vec<CapacityEntry>, BoxError> {
        let rows = sqlx::query_as::<_, CapacityRow>(
            "SELECT id, sailing_id, class_id, quota \
             FROM capacity_ledger WHERE sailing_id = $1 ORDER BY class_id",
        )
        .bind(sailing_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(CapacityEntry::from).collect())
    }

    async fn count_occupied(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
        statuses: &[TicketStatus],
    ) -> Result<i64, BoxError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ticket \
             WHERE sailing_id = $1 AND class_id = $2 AND status = ANY($3)",
        )
        .bind(sailing_id)
        .bind(class_id)
        .bind(&statuses)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn count_assigned_seats(
        &mut self,
        sailing_id: Uuid,
        class_id: Uuid,
    ) -> Result<i64, BoxError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ticket \
             WHERE sailing_id = $1 AND class_id = $2 AND seat_number IS NOT NULL",
        )
        .bind(sailing_id)
        .bind(class_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }
}
