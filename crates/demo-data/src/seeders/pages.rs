//! Static page seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedError, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::Page;
use shopfront::modules::keys;
use shopfront::store::{Document, Store};

pub struct PageSeeder {
    slugs: UniqueKeys,
}

impl PageSeeder {
    pub fn new() -> Self {
        Self {
            slugs: UniqueKeys::new(),
        }
    }
}

impl Default for PageSeeder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleSeeder for PageSeeder {
    fn module_key(&self) -> &'static str {
        keys::PAGES
    }

    async fn pre_seed(&mut self, _store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let title = faker::title(rng);
        let slug = self.slugs.claim(&faker::slugify(&title))?;

        let page = Page {
            id: Uuid::new_v4(),
            title,
            slug,
            body: faker::paragraph(rng),
            published: rng.gen_bool(0.8),
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..365)),
        };
        to_doc(&page)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let non_empty = |field: &str| {
            candidate
                .get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
        };
        non_empty("title") && non_empty("slug") && non_empty("body")
    }
}
