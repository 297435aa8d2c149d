//! A drying floor with three simulated rooms behind the dashboard gateway.
//!
//! ```text
//! cargo run -p drying-floor                                  # defaults, in-memory state
//! CUREROOM_CONFIG=floor.json cargo run -p drying-floor       # DashboardConfig as JSON
//! CUREROOM_BIND_ADDR=0.0.0.0:9000 cargo run -p drying-floor  # single override
//! ```

use cureroom::prelude::*;

/// Hours of synthetic history given to rooms that start with none.
const SEED_HOURS: u32 = 24;

#[tokio::main]
async fn main() -> Result<(), CureroomError> {
    cureroom::logging::init("cureroom=info,drying_floor=info");

    let config = DashboardConfig::load()?;

    match config.data_dir.clone() {
        Some(dir) => serve(config, FileStore::open(dir).await?).await,
        None => serve(config, MemoryStore::new()).await,
    }
}

async fn serve<S: SnapshotStore>(config: DashboardConfig, store: S) -> Result<(), CureroomError> {
    let server = DashboardServerBuilder::new().config(config).build(store).await?;

    for room in server.rooms().await {
        let csv = room.export_csv().await?;
        if csv.lines().count() <= 1 {
            let rows = synthetic_profile(chrono::Utc::now(), SEED_HOURS, &mut rand::rng());
            room.seed_history(rows).await?;
        }
        tracing::info!(room_id = %room.room_id(), name = room.name(), "room ready");
    }

    tracing::info!(addr = %server.local_addr()?, "drying floor online");
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
    }
}

