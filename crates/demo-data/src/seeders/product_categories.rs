//! Product category seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use uuid::Uuid;

use super::{ModuleSeeder, SeedError, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::ProductCategory;
use shopfront::modules::keys;
use shopfront::store::{Document, Store};

const DEPARTMENTS: [&str; 10] = [
    "Coffee & Tea",
    "Snacks",
    "Kitchenware",
    "Electronics",
    "Beauty",
    "Stationery",
    "Toys & Games",
    "Apparel",
    "Fresh Produce",
    "Homeware",
];

pub struct ProductCategorySeeder {
    slugs: UniqueKeys,
    next_department: usize,
}

impl ProductCategorySeeder {
    pub fn new() -> Self {
        Self {
            slugs: UniqueKeys::new(),
            next_department: 0,
        }
    }
}

#[async_trait]
impl ModuleSeeder for ProductCategorySeeder {
    fn module_key(&self) -> &'static str {
        keys::PRODUCT_CATEGORIES
    }

    async fn pre_seed(&mut self, _store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        // Walk the department list before falling back to random picks, so
        // small seed counts get distinct storefront departments.
        let name = if self.next_department < DEPARTMENTS.len() {
            let name = DEPARTMENTS[self.next_department];
            self.next_department += 1;
            name
        } else {
            DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())]
        };
        let slug = self.slugs.claim(&faker::slugify(name))?;

        // product_count starts at zero; the product seeder's post-seed pass
        // recomputes it from the table.
        let category = ProductCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug,
            description: faker::sentence(rng),
            product_count: 0,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_counts_get_distinct_departments() {
        let mut seeder = ProductCategorySeeder::new();
        let mut rng = rand::thread_rng();

        let mut names = std::collections::HashSet::new();
        for _ in 0..6 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            assert!(names.insert(doc["name"].as_str().unwrap().to_string()));
        }
    }
}
