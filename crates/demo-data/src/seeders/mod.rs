//! Module seeder contract and registry.
//!
//! One seeder per seedable module. A seeder loads its dependency snapshot
//! up front (`pre_seed`), generates candidate records one at a time against
//! that snapshot, validates each candidate structurally, and recomputes
//! derived aggregates after the batch (`post_seed`). Selection is by
//! registry lookup, not inheritance: [`SeederRegistry`] is the single
//! source of truth for which modules are seedable.

pub mod banners;
pub mod customers;
pub mod orders;
pub mod pages;
pub mod post_categories;
pub mod posts;
pub mod product_categories;
pub mod products;
pub mod promotions;
pub mod reviews;

pub use banners::BannerSeeder;
pub use customers::CustomerSeeder;
pub use orders::OrderSeeder;
pub use pages::PageSeeder;
pub use post_categories::PostCategorySeeder;
pub use posts::PostSeeder;
pub use product_categories::ProductCategorySeeder;
pub use products::ProductSeeder;
pub use promotions::PromotionSeeder;
pub use reviews::ReviewSeeder;

use async_trait::async_trait;
use rand::RngCore;
use thiserror::Error;

use crate::faker::UniqueKeyExhausted;
use shopfront::modules::registry;
use shopfront::modules::toggle::ToggleError;
use shopfront::modules::{GraphError, keys};
use shopfront::store::{Document, Filter, Store, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    /// A required dependency module has too few records (or none at all).
    #[error("dependency unsatisfied for '{module}': {detail}")]
    DependencyUnsatisfied { module: String, detail: String },

    #[error(transparent)]
    UniqueKey(#[from] UniqueKeyExhausted),

    #[error("generated record failed validation")]
    ValidationFailed,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Toggle(#[from] ToggleError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// How a seeder relies on another module's records.
#[derive(Debug, Clone)]
pub struct SeedDependency {
    pub module: &'static str,
    /// Required dependencies fail the seed when absent; advisory ones only
    /// shape what can be generated.
    pub required: bool,
    /// Minimum persisted record count the dependency must hold before this
    /// module may be seeded. Zero means any non-empty is fine.
    pub min_records: u64,
}

impl SeedDependency {
    pub fn required(module: &'static str, min_records: u64) -> Self {
        Self {
            module,
            required: true,
            min_records,
        }
    }

    pub fn advisory(module: &'static str) -> Self {
        Self {
            module,
            required: false,
            min_records: 0,
        }
    }
}

/// Record synthesis logic for exactly one module.
#[async_trait]
pub trait ModuleSeeder: Send + Sync {
    fn module_key(&self) -> &'static str;

    /// Modules whose records this seeder reads while generating.
    fn dependencies(&self) -> Vec<SeedDependency> {
        Vec::new()
    }

    /// Loads the dependency snapshot this run will reference and verifies
    /// record thresholds. Fails fast rather than generating records that
    /// cannot reference anything.
    async fn pre_seed(&mut self, store: &dyn Store, quantity: u32) -> Result<(), SeedError>;

    /// Generates one candidate record. Pure with respect to persisted state
    /// except for the snapshot loaded in `pre_seed`.
    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError>;

    /// Structural check before persisting: required fields present, numeric
    /// fields positive, foreign keys contained in the snapshot.
    fn validate(&self, candidate: &Document) -> bool;

    /// Recomputes derived aggregates by re-scanning the affected tables.
    /// Must be idempotent.
    async fn post_seed(&self, _store: &dyn Store, _inserted: u32) -> Result<(), SeedError> {
        Ok(())
    }
}

/// Maps a module key to its seeder implementation.
pub struct SeederRegistry;

impl SeederRegistry {
    /// Builds a fresh seeder for one run. Seeders carry per-run state (the
    /// dependency snapshot, the unique-key pool), so each run gets its own.
    pub fn create(key: &str) -> Option<Box<dyn ModuleSeeder>> {
        match key {
            keys::PAGES => Some(Box::new(PageSeeder::new())),
            keys::POST_CATEGORIES => Some(Box::new(PostCategorySeeder::new())),
            keys::POSTS => Some(Box::new(PostSeeder::new())),
            keys::PRODUCT_CATEGORIES => Some(Box::new(ProductCategorySeeder::new())),
            keys::PRODUCTS => Some(Box::new(ProductSeeder::new())),
            keys::CUSTOMERS => Some(Box::new(CustomerSeeder::new())),
            keys::ORDERS => Some(Box::new(OrderSeeder::new())),
            keys::REVIEWS => Some(Box::new(ReviewSeeder::new())),
            keys::PROMOTIONS => Some(Box::new(PromotionSeeder::new())),
            keys::BANNERS => Some(Box::new(BannerSeeder::new())),
            _ => None,
        }
    }

    pub fn is_seedable(key: &str) -> bool {
        matches!(
            key,
            keys::PAGES
                | keys::POST_CATEGORIES
                | keys::POSTS
                | keys::PRODUCT_CATEGORIES
                | keys::PRODUCTS
                | keys::CUSTOMERS
                | keys::ORDERS
                | keys::REVIEWS
                | keys::PROMOTIONS
                | keys::BANNERS
        )
    }

    /// Seedable module keys in registry declaration order.
    pub fn seedable_keys() -> Vec<&'static str> {
        registry::all()
            .iter()
            .filter(|def| Self::is_seedable(def.key))
            .map(|def| def.key)
            .collect()
    }
}

/// Serializes a generated record into its store document.
pub(crate) fn to_doc<T: serde::Serialize>(record: &T) -> Result<Document, SeedError> {
    Ok(serde_json::to_value(record).map_err(StoreError::Serialization)?)
}

/// Counts a dependency's persisted records and enforces its threshold.
/// Shared by the `pre_seed` implementations.
pub(crate) async fn require_records(
    store: &dyn Store,
    module: &'static str,
    dep: &SeedDependency,
) -> Result<u64, SeedError> {
    let def = registry::find(dep.module).ok_or_else(|| SeedError::UnknownModule(dep.module.to_string()))?;
    let count = store.count(def.table, Filter::All).await?;

    let needed = dep.min_records.max(1);
    if dep.required && count < needed {
        return Err(SeedError::DependencyUnsatisfied {
            module: module.to_string(),
            detail: format!(
                "need at least {needed} {} record(s), found {count}",
                dep.module
            ),
        });
    }
    Ok(count)
}
