use async_trait::async_trait;
use chrono::{DateTime, Utc};
use farled_core::sailing::{Fare, Manifest, Sailing};
use farled_core::store::{BoxError, CatalogOps};
use farled_core::ticket::TicketKind;
use uuid::Uuid;

use super::PgTx;

#[derive(sqlx::FromRow)]
struct SailingRow {
    id: Uuid,
    ship_id: Uuid,
    route_id: Uuid,
    route_alias: String,
    ship_alias: String,
    departs_at: DateTime<Utc>,
    arrives_at: DateTime<Utc>,
}

impl From<SailingRow> for Sailing {
    fn from(row: SailingRow) -> Self {
        Sailing {
            id: row.id,
            ship_id: row.ship_id,
            route_id: row.route_id,
            route_alias: row.route_alias,
            ship_alias: row.ship_alias,
            departs_at: row.departs_at,
            arrives_at: row.arrives_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ManifestRow {
    id: Uuid,
    ship_id: Uuid,
    class_id: Uuid,
    class_alias: String,
    kind: String,
}

impl TryFrom<ManifestRow> for Manifest {
    type Error = BoxError;

    fn try_from(row: ManifestRow) -> Result<Self, Self::Error> {
        Ok(Manifest {
            id: row.id,
            ship_id: row.ship_id,
            class_id: row.class_id,
            class_alias: row.class_alias,
            kind: row.kind.parse::<TicketKind>()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FareRow {
    id: Uuid,
    manifest_id: Uuid,
    route_id: Uuid,
    price_cents: i64,
}

impl From<FareRow> for Fare {
    fn from(row: FareRow) -> Self {
        Fare {
            id: row.id,
            manifest_id: row.manifest_id,
            route_id: row.route_id,
            price_cents: row.price_cents,
        }
    }
}

#[async_trait]
impl CatalogOps for PgTx {
    async fn sailing_by_id(&mut self, id: Uuid) -> Result<Option<Sailing>, BoxError> {
        let row = sqlx::query_as::<_, SailingRow>(
            "SELECT id, ship_id, route_id, route_alias, ship_alias, departs_at, arrives_at \
             FROM sailing WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Sailing::from))
    }

    async fn manifest_by_ship_and_class(
        &mut self,
        ship_id: Uuid,
        class_id: Uuid,
    ) -> Result<Option<Manifest>, BoxError> {
        let row = sqlx::query_as::<_, ManifestRow>(
            "SELECT id, ship_id, class_id, class_alias, kind \
             FROM manifest WHERE ship_id = $1 AND class_id = $2",
        )
        .bind(ship_id)
        .bind(class_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Manifest::try_from).transpose()
    }

    async fn fare_by_manifest_and_route(
        &mut self,
        manifest_id: Uuid,
        route_id: Uuid,
    ) -> Result<Option<Fare>, BoxError> {
        let row = sqlx::query_as::<_, FareRow>(
            "SELECT id, manifest_id, route_id, price_cents \
             FROM fare WHERE manifest_id = $1 AND route_id = $2",
        )
        .bind(manifest_id)
        .bind(route_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Fare::from))
    }
}
