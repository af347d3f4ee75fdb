//! Promotion seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, require_records, to_doc};
use crate::faker::UniqueKeys;
use shopfront::models::Promotion;
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id};

const CAMPAIGNS: [&str; 8] = [
    "Mid-year Sale",
    "Payday Deal",
    "Weekend Flash Sale",
    "New Customer Offer",
    "Clearance",
    "Holiday Bundle",
    "Free Ship Friday",
    "Loyalty Reward",
];

pub struct PromotionSeeder {
    product_ids: Vec<Uuid>,
    codes: UniqueKeys,
}

impl PromotionSeeder {
    pub fn new() -> Self {
        Self {
            product_ids: Vec::new(),
            codes: UniqueKeys::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for PromotionSeeder {
    fn module_key(&self) -> &'static str {
        keys::PROMOTIONS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![SeedDependency::required(keys::PRODUCTS, 1)]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        for dep in self.dependencies() {
            require_records(store, keys::PROMOTIONS, &dep).await?;
        }

        let table = registry::find(keys::PRODUCTS).unwrap().table;
        self.product_ids = store
            .query(table, Filter::All)
            .await?
            .iter()
            .filter_map(doc_id)
            .collect();
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let code = self.codes.claim(&format!("SALE{}", rng.gen_range(1000..10_000)))?;

        let target_count = rng.gen_range(1..=self.product_ids.len().min(6));
        let mut ids = self.product_ids.clone();
        for i in 0..target_count {
            let j = rng.gen_range(i..ids.len());
            ids.swap(i, j);
        }
        ids.truncate(target_count);

        let starts_at = OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..30));
        let ends_at = starts_at + Duration::days(rng.gen_range(7..45));

        let promotion = Promotion {
            id: Uuid::new_v4(),
            code,
            name: CAMPAIGNS[rng.gen_range(0..CAMPAIGNS.len())].to_string(),
            percent_off: rng.gen_range(1u8..=10) * 5,
            product_ids: ids,
            starts_at,
            ends_at,
            active: ends_at > OffsetDateTime::now_utc(),
        };
        to_doc(&promotion)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let percent_ok = candidate
            .get("percent_off")
            .and_then(|v| v.as_u64())
            .is_some_and(|p| (1..=90).contains(&p));

        let Some(ids) = candidate.get("product_ids").and_then(|v| v.as_array()) else {
            return false;
        };
        let products_ok = !ids.is_empty()
            && ids.iter().all(|id| {
                id.as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .is_some_and(|id| self.product_ids.contains(&id))
            });

        percent_ok && products_ok
    }
}
