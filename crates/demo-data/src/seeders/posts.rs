//! Blog post seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, require_records, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::Post;
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id};

pub struct PostSeeder {
    category_ids: Vec<Uuid>,
    slugs: UniqueKeys,
}

impl PostSeeder {
    pub fn new() -> Self {
        Self {
            category_ids: Vec::new(),
            slugs: UniqueKeys::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for PostSeeder {
    fn module_key(&self) -> &'static str {
        keys::POSTS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![SeedDependency::required(keys::POST_CATEGORIES, 1)]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        for dep in self.dependencies() {
            require_records(store, keys::POSTS, &dep).await?;
        }

        let table = registry::find(keys::POST_CATEGORIES).unwrap().table;
        let docs = store.query(table, Filter::All).await?;
        self.category_ids = docs.iter().filter_map(doc_id).collect();
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let title = faker::title(rng);
        let slug = self.slugs.claim(&faker::slugify(&title))?;
        let category_id = self.category_ids[rng.gen_range(0..self.category_ids.len())];

        let body = (0..rng.gen_range(2..5))
            .map(|_| faker::paragraph(rng))
            .collect::<Vec<_>>()
            .join("\n\n");
        let tags = (0..rng.gen_range(1..5))
            .map(|_| faker::slugify(&faker::title(rng)))
            .collect();

        let post = Post {
            id: Uuid::new_v4(),
            category_id,
            title,
            slug,
            excerpt: faker::sentence(rng),
            body,
            tags,
            published: rng.gen_bool(0.85),
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..365)),
        };
        to_doc(&post)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let category_ok = candidate
            .get("category_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| self.category_ids.contains(&id));

        category_ok
            && candidate
                .get("title")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
    }
}
