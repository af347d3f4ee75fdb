//! Example: Seed a commerce demo into an in-memory store.
//!
//! This applies the built-in "shop" preset end to end (module enablement in
//! dependency order, then seeding with valid cross-references) without
//! needing a database.
//!
//! Run with:
//! ```
//! cargo run -p demo-data --example seed_shop
//! ```

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use demo_data::orchestrator::SeedOrchestrator;
use shopfront::store::{Filter, MemoryStore, Store, tables};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let mut orchestrator = SeedOrchestrator::new(store.clone())?.with_seed(12345);

    let report = orchestrator.apply_preset("shop").await?;

    tracing::info!("Preset applied!");
    for result in &report.results {
        tracing::info!("  {}: {:?}", result.module, result.status);
    }

    for table in [
        tables::PRODUCT_CATEGORIES,
        tables::PRODUCTS,
        tables::CUSTOMERS,
        tables::ORDERS,
        tables::REVIEWS,
    ] {
        let count = store.count(table, Filter::All).await?;
        tracing::info!("  {}: {} records", table, count);
    }

    Ok(())
}
