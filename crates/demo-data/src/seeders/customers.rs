//! Customer seeding.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedError, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::Customer;
use shopfront::modules::keys;
use shopfront::store::{Document, Store};

pub struct CustomerSeeder {
    emails: UniqueKeys,
}

impl CustomerSeeder {
    pub fn new() -> Self {
        Self {
            emails: UniqueKeys::new(),
        }
    }
}

#[async_trait]
impl ModuleSeeder for CustomerSeeder {
    fn module_key(&self) -> &'static str {
        keys::CUSTOMERS
    }

    async fn pre_seed(&mut self, _store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_one(&mut self, rng: &mut dyn RngCore) -> Result<Document, SeedError> {
        let name = faker::full_name(rng);
        let email = self.emails.claim(&faker::email_for(&name, rng))?;

        // Aggregates start at zero; the order seeder's post-seed pass owns
        // them from then on.
        let customer = Customer {
            id: Uuid::new_v4(),
            name,
            email,
            phone: faker::phone(rng),
            address: faker::street_address(rng),
            city: faker::city(rng),
            order_count: 0,
            total_spent: 0,
            created_at: OffsetDateTime::now_utc() - Duration::days(rng.gen_range(0..730)),
        };
        to_doc(&customer)
    }

    fn validate(&self, candidate: &Document) -> bool {
        candidate
            .get("name")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.is_empty())
            && candidate
                .get("email")
                .and_then(|v| v.as_str())
                .is_some_and(|s| s.contains('@'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_customers_are_valid_with_unique_emails() {
        let mut seeder = CustomerSeeder::new();
        let mut rng = rand::thread_rng();

        let mut emails = std::collections::HashSet::new();
        for _ in 0..25 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            assert!(seeder.validate(&doc));
            assert!(emails.insert(doc["email"].as_str().unwrap().to_string()));
        }
    }
}
