use std::sync::Arc;
use std::time::Duration;

use farled_reserve::{ExpirySweeper, HoldPolicy, ReservationService};
use farled_store::app_config::Config;
use farled_store::{DbClient, PgStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farled=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let policy = HoldPolicy {
        data_entry_ttl: chrono::Duration::minutes(config.hold.data_entry_minutes),
        payment_ttl: chrono::Duration::minutes(config.hold.payment_minutes),
        sweep_batch: config.sweep.batch_size,
    };
    let service = Arc::new(ReservationService::new(PgStore::new(db.pool.clone()), policy));

    let sweeper = ExpirySweeper::new(
        service,
        Duration::from_secs(config.sweep.interval_seconds),
    );
    let handle = sweeper.start();

    tracing::info!("farled reservation engine running, ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    handle.abort();
}
