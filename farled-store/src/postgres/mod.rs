mod booking;
mod catalog;
mod quota;
mod session;
mod ticket;

use async_trait::async_trait;
use farled_core::store::{BoxError, ReservationStore, StoreTx};
use sqlx::{PgPool, Postgres, Transaction};

/// Postgres-backed reservation store. The capacity ledger row is the unit
/// of pessimistic locking; everything else is ordinary transactional SQL.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, BoxError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx })
    }
}

/// One open Postgres transaction. Dropping it uncommitted rolls back,
/// which is how engine errors and panics release their row locks.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self) -> Result<(), BoxError> {
        self.tx.commit().await?;
        Ok(())
    }
}
