//! Product review seeding.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::{Rng, RngCore};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, require_records, to_doc};
use crate::faker;
use shopfront::models::Review;
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id, tables};

/// Skewed toward the high end, like real storefront reviews.
const RATING_WEIGHTS: [(u8, f64); 5] = [
    (5, 0.45),
    (4, 0.30),
    (3, 0.15),
    (2, 0.06),
    (1, 0.04),
];

const TITLES: [&str; 10] = [
    "Exactly as described",
    "Great value",
    "Would buy again",
    "Fast delivery",
    "Good, with caveats",
    "Better than expected",
    "Solid everyday choice",
    "Not quite for me",
    "Five stars",
    "Happy with this purchase",
];

pub struct ReviewSeeder {
    product_ids: Vec<Uuid>,
    customer_ids: Vec<Uuid>,
    seen_pairs: HashSet<(Uuid, Uuid)>,
}

impl ReviewSeeder {
    pub fn new() -> Self {
        Self {
            product_ids: Vec::new(),
            customer_ids: Vec::new(),
            seen_pairs: HashSet::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for ReviewSeeder {
    fn module_key(&self) -> &'static str {
        keys::REVIEWS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![
            SeedDependency::required(keys::PRODUCTS, 1),
            SeedDependency::required(keys::CUSTOMERS, 1),
        ]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        for dep in self.dependencies() {
            require_records(store, keys::REVIEWS, &dep).await?;
        }

        let products_table = registry::find(keys::PRODUCTS).unwrap().table;
        self.product_ids = store
            .query(products_table, Filter::All)
            .await?
            .iter()
            .filter_map(doc_id)
            .collect();

        let customers_table = registry::find(keys::CUSTOMERS).unwrap().table;
        self.customer_ids = store
            .query(customers_table, Filter::All)
            .await?
            .iter()
            .filter_map(doc_id)
            .collect();
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        // Prefer unseen (product, customer) pairs; after a few misses fall
        // through and allow a repeat reviewer.
        let mut product_id = self.product_ids[rng.gen_range(0..self.product_ids.len())];
        let mut customer_id = self.customer_ids[rng.gen_range(0..self.customer_ids.len())];
        for _ in 0..10 {
            if !self.seen_pairs.contains(&(product_id, customer_id)) {
                break;
            }
            product_id = self.product_ids[rng.gen_range(0..self.product_ids.len())];
            customer_id = self.customer_ids[rng.gen_range(0..self.customer_ids.len())];
        }
        self.seen_pairs.insert((product_id, customer_id));

        let body = if rng.gen_bool(0.5) {
            faker::sentence(rng)
        } else {
            faker::paragraph(rng)
        };

        let review = Review {
            id: Uuid::new_v4(),
            product_id,
            customer_id,
            rating: *faker::weighted_choice(&RATING_WEIGHTS, rng),
            title: TITLES[rng.gen_range(0..TITLES.len())].to_string(),
            body,
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..365)),
        };
        to_doc(&review)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let product_ok = candidate
            .get("product_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| self.product_ids.contains(&id));
        let customer_ok = candidate
            .get("customer_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| self.customer_ids.contains(&id));
        let rating_ok = candidate
            .get("rating")
            .and_then(|v| v.as_u64())
            .is_some_and(|r| (1..=5).contains(&r));

        product_ok && customer_ok && rating_ok
    }

    /// Recomputes each product's rating stats from the reviews table.
    async fn post_seed(&self, store: &dyn Store, _inserted: u32) -> Result<(), SeedError> {
        for product_id in &self.product_ids {
            let reviews = store
                .query(
                    tables::REVIEWS,
                    Filter::field("product_id", product_id.to_string()),
                )
                .await?;

            let count = reviews.len() as u32;
            let rating_avg = if count == 0 {
                0.0
            } else {
                let sum: u64 = reviews
                    .iter()
                    .filter_map(|r| r.get("rating").and_then(|v| v.as_u64()))
                    .sum();
                // One decimal, matching what the storefront displays.
                (sum as f64 / count as f64 * 10.0).round() / 10.0
            };

            store
                .patch(
                    tables::PRODUCTS,
                    *product_id,
                    json!({ "rating_avg": rating_avg, "review_count": count }),
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratings_stay_in_range() {
        let mut seeder = ReviewSeeder::new();
        seeder.product_ids = vec![Uuid::new_v4()];
        seeder.customer_ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let mut rng = rand::thread_rng();

        for _ in 0..40 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            assert!(seeder.validate(&doc));
        }
    }
}
