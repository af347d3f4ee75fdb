//! Named seeding presets.
//!
//! Built-in presets are declared in code; operator-defined ones persist in
//! the store and shadow nothing: lookups check the built-ins first.

use tracing::info;

use crate::seeders::SeedError;
use shopfront::models::{Preset, PresetEntry};
use shopfront::modules::{keys, registry};
use shopfront::store::{Filter, Store, StoreError, doc_id, tables};

fn entry(module: &str, quantity: u32) -> PresetEntry {
    PresetEntry {
        module: module.to_string(),
        quantity,
    }
}

/// Presets every installation ships with.
pub fn builtin() -> Vec<Preset> {
    let full_demo_entries = registry::all()
        .iter()
        .filter(|def| crate::seeders::SeederRegistry::is_seedable(def.key))
        .map(|def| entry(def.key, def.default_count))
        .collect();

    vec![
        Preset {
            key: "blog".to_string(),
            name: "Blog".to_string(),
            entries: vec![
                entry(keys::PAGES, 4),
                entry(keys::POST_CATEGORIES, 5),
                entry(keys::POSTS, 20),
            ],
        },
        Preset {
            key: "shop".to_string(),
            name: "Shop".to_string(),
            entries: vec![
                entry(keys::PRODUCT_CATEGORIES, 6),
                entry(keys::PRODUCTS, 30),
                entry(keys::CUSTOMERS, 25),
                entry(keys::ORDERS, 40),
                entry(keys::REVIEWS, 60),
            ],
        },
        Preset {
            key: "full-demo".to_string(),
            name: "Full demo".to_string(),
            entries: full_demo_entries,
        },
    ]
}

/// Looks a preset up by key: built-ins first, then the store.
pub async fn load(store: &dyn Store, key: &str) -> Result<Option<Preset>, SeedError> {
    if let Some(preset) = builtin().into_iter().find(|p| p.key == key) {
        return Ok(Some(preset));
    }

    let docs = store.query(tables::PRESETS, Filter::field("key", key)).await?;
    match docs.into_iter().next() {
        Some(doc) => Ok(Some(
            serde_json::from_value(doc).map_err(StoreError::Serialization)?,
        )),
        None => Ok(None),
    }
}

/// Upserts an operator-defined preset by key.
pub async fn save(store: &dyn Store, preset: &Preset) -> Result<(), SeedError> {
    let doc = serde_json::to_value(preset).map_err(StoreError::Serialization)?;

    let existing = store
        .query(tables::PRESETS, Filter::field("key", preset.key.clone()))
        .await?;
    match existing.first().and_then(doc_id) {
        Some(id) => store.patch(tables::PRESETS, id, doc).await?,
        None => {
            store.insert(tables::PRESETS, doc).await?;
        }
    }
    Ok(())
}

/// Persists the built-in presets that are not in the store yet. Part of the
/// factory reset baseline.
pub async fn install_builtin(store: &dyn Store) -> Result<(), SeedError> {
    for preset in builtin() {
        let existing = store
            .query(tables::PRESETS, Filter::field("key", preset.key.clone()))
            .await?;
        if existing.is_empty() {
            save(store, &preset).await?;
        }
    }
    info!("Installed built-in presets");
    Ok(())
}
