//! Post category seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use uuid::Uuid;

use super::{ModuleSeeder, SeedError, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::PostCategory;
use shopfront::modules::keys;
use shopfront::store::{Document, Store};

const TOPICS: [&str; 10] = [
    "Travel",
    "Recipes",
    "Style",
    "Gadgets",
    "Home & Living",
    "Health",
    "Guides",
    "Behind the Scenes",
    "Community",
    "Seasonal",
];

pub struct PostCategorySeeder {
    slugs: UniqueKeys,
}

impl PostCategorySeeder {
    pub fn new() -> Self {
        Self {
            slugs: UniqueKeys::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for PostCategorySeeder {
    fn module_key(&self) -> &'static str {
        keys::POST_CATEGORIES
    }

    async fn pre_seed(&mut self, _store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let topic = TOPICS[rng.gen_range(0..TOPICS.len())];
        let slug = self.slugs.claim(&faker::slugify(topic))?;

        let category = PostCategory {
            id: Uuid::new_v4(),
            name: topic.to_string(),
            slug,
            description: faker::sentence(rng),
        };
        to_doc(&category)
    }

    fn validate(&self, candidate: &Document) -> bool {
        candidate
            .get("name")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty())
            && candidate
                .get("slug")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
    }
}
