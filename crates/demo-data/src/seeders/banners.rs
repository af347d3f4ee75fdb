//! Homepage banner seeding.
//!
//! Banners target either a post or a product, mirroring the module's `any`
//! dependency declaration: at least one of the two pools must be non-empty,
//! and generation draws from whichever pools exist.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, to_doc};
use shopfront::models::{Banner, BannerTarget};
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id};

const HEADLINES: [&str; 8] = [
    "Shop the new arrivals",
    "Fresh stories on the blog",
    "Deal of the day",
    "Back in stock",
    "Editor's picks",
    "Weekend reading",
    "Bestsellers under 200k",
    "Just dropped",
];

pub struct BannerSeeder {
    post_ids: Vec<Uuid>,
    product_ids: Vec<Uuid>,
}

impl BannerSeeder {
    pub fn new() -> Self {
        Self {
            post_ids: Vec::new(),
            product_ids: Vec::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for BannerSeeder {
    fn module_key(&self) -> &'static str {
        keys::BANNERS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![
            SeedDependency::advisory(keys::POSTS),
            SeedDependency::advisory(keys::PRODUCTS),
        ]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        let posts_table = registry::find(keys::POSTS).unwrap().table;
        self.post_ids = store
            .query(posts_table, Filter::All)
            .await?
            .iter()
            .filter_map(doc_id)
            .collect();

        let products_table = registry::find(keys::PRODUCTS).unwrap().table;
        self.product_ids = store
            .query(products_table, Filter::All)
            .await?
            .iter()
            .filter_map(doc_id)
            .collect();

        if self.post_ids.is_empty() && self.product_ids.is_empty() {
            return Err(SeedError::DependencyUnsatisfied {
                module: keys::BANNERS.to_string(),
                detail: "needs at least one post or product to target".to_string(),
            });
        }
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let take_product = if self.post_ids.is_empty() {
            true
        } else if self.product_ids.is_empty() {
            false
        } else {
            rng.gen_bool(0.5)
        };

        let target = if take_product {
            BannerTarget::Product(self.product_ids[rng.gen_range(0..self.product_ids.len())])
        } else {
            BannerTarget::Post(self.post_ids[rng.gen_range(0..self.post_ids.len())])
        };

        let banner = Banner {
            id: Uuid::new_v4(),
            title: HEADLINES[rng.gen_range(0..HEADLINES.len())].to_string(),
            target,
            position: rng.gen_range(1..=20),
            active: rng.gen_bool(0.8),
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..90)),
        };
        to_doc(&banner)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let Some(target) = candidate.get("target") else {
            return false;
        };
        let id = target
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());

        match (target.get("kind").and_then(|v| v.as_str()), id) {
            (Some("post"), Some(id)) => self.post_ids.contains(&id),
            (Some("product"), Some(id)) => self.product_ids.contains(&id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banners_fall_back_to_the_populated_pool() {
        let mut seeder = BannerSeeder::new();
        seeder.product_ids = vec![Uuid::new_v4()];
        let mut rng = rand::thread_rng();

        for _ in 0..20 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            assert!(seeder.validate(&doc));
            assert_eq!(doc["target"]["kind"], "product");
        }
    }
}
