//! Product seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, require_records, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::Product;
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id, tables};

const ADJECTIVES: [&str; 10] = [
    "Classic", "Premium", "Handmade", "Organic", "Compact", "Wireless", "Ceramic", "Bamboo",
    "Stainless", "Vintage",
];

const GOODS: [&str; 12] = [
    "Coffee Beans",
    "Tea Set",
    "Rice Cooker",
    "Desk Lamp",
    "Notebook",
    "Backpack",
    "Water Bottle",
    "Speaker",
    "Face Cream",
    "Cutting Board",
    "Phone Stand",
    "Candle",
];

pub struct ProductSeeder {
    category_ids: Vec<Uuid>,
    slugs: UniqueKeys,
    skus: UniqueKeys,
}

impl ProductSeeder {
    pub fn new() -> Self {
        Self {
            category_ids: Vec::new(),
            slugs: UniqueKeys::new(),
            skus: UniqueKeys::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for ProductSeeder {
    fn module_key(&self) -> &'static str {
        keys::PRODUCTS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![SeedDependency::required(keys::PRODUCT_CATEGORIES, 1)]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        for dep in self.dependencies() {
            require_records(store, keys::PRODUCTS, &dep).await?;
        }

        let table = registry::find(keys::PRODUCT_CATEGORIES).unwrap().table;
        let docs = store.query(table, Filter::All).await?;
        self.category_ids = docs.iter().filter_map(doc_id).collect();
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
        let goods = GOODS[rng.gen_range(0..GOODS.len())];
        let name = format!("{adjective} {goods}");

        let slug = self.slugs.claim(&faker::slugify(&name))?;
        let sku = self
            .skus
            .claim(&format!("SF-{:05}", rng.gen_range(0..100_000)))?;
        let category_id = self.category_ids[rng.gen_range(0..self.category_ids.len())];

        let product = Product {
            id: Uuid::new_v4(),
            category_id,
            name,
            slug,
            sku,
            description: faker::paragraph(rng),
            price: faker::money(rng, 15_000, 2_500_000, 1_000),
            stock: rng.gen_range(0..=500),
            rating_avg: 0.0,
            review_count: 0,
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..365)),
        };
        to_doc(&product)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let category_ok = candidate
            .get("category_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| self.category_ids.contains(&id));

        let price_ok = candidate
            .get("price")
            .and_then(|v| v.as_i64())
            .is_some_and(|p| p > 0);

        category_ok
            && price_ok
            && candidate
                .get("sku")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
    }

    /// Recomputes each category's denormalized product counter from the
    /// products table. Running it twice leaves the same counts.
    async fn post_seed(&self, store: &dyn Store, _inserted: u32) -> Result<(), SeedError> {
        for category_id in &self.category_ids {
            let count = store
                .count(
                    tables::PRODUCTS,
                    Filter::field("category_id", category_id.to_string()),
                )
                .await?;
            store
                .patch(
                    tables::PRODUCT_CATEGORIES,
                    *category_id,
                    json!({ "product_count": count }),
                )
                .await?;
        }
        Ok(())
    }
}
