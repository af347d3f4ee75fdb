//! Order seeding.
//!
//! Orders are the deepest record in the graph: every line references a
//! product and every order references a customer, both taken from the
//! snapshot loaded in `pre_seed` so references always resolve to records
//! that existed at generation time.

use async_trait::async_trait;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Poisson};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{ModuleSeeder, SeedDependency, SeedError, require_records, to_doc};
use crate::faker::{self, UniqueKeys};
use shopfront::models::{Order, OrderItem, OrderStatus};
use shopfront::modules::{keys, registry};
use shopfront::store::{Document, Filter, Store, doc_id, tables};

/// Configuration for order generation.
#[derive(Debug, Clone)]
pub struct OrderGenConfig {
    /// Upper bound on distinct products per order.
    pub max_items: usize,
    /// Mean of the Poisson draw for per-line quantities (shifted by one).
    pub quantity_mean: f64,
    /// Probability that an order carries a discount.
    pub discount_probability: f64,
    /// How far back order history reaches, in days.
    pub history_days: i64,
}

impl Default for OrderGenConfig {
    fn default() -> Self {
        Self {
            max_items: 4,
            quantity_mean: 0.8,
            discount_probability: 0.2,
            history_days: 180,
        }
    }
}

/// Snapshot row for one product the order lines may reference.
#[derive(Debug, Clone)]
struct ProductRef {
    id: Uuid,
    name: String,
    price: i64,
}

pub struct OrderSeeder {
    config: OrderGenConfig,
    products: Vec<ProductRef>,
    customer_ids: Vec<Uuid>,
    codes: UniqueKeys,
}

impl OrderSeeder {
    pub fn new() -> Self {
        Self::with_config(OrderGenConfig::default())
    }

    pub fn with_config(config: OrderGenConfig) -> Self {
        Self {
            config,
            products: Vec::new(),
            customer_ids: Vec::new(),
            codes: UniqueKeys::new(),
        }
    }

    fn generate_items(&self, rng: &mut dyn RngCore) -> Vec<OrderItem> {
        let max = self.config.max_items.min(self.products.len()).max(1);
        let item_count = rng.gen_range(1..=max);
        let poisson = Poisson::new(self.config.quantity_mean).unwrap();

        // Distinct products per order: walk a shuffled prefix of indexes.
        let mut indexes: Vec<usize> = (0..self.products.len()).collect();
        for i in 0..item_count {
            let j = rng.gen_range(i..indexes.len());
            indexes.swap(i, j);
        }

        indexes[..item_count]
            .iter()
            .map(|&idx| {
                let product = &self.products[idx];
                let quantity = (poisson.sample(rng) as u32 + 1).min(5);
                OrderItem {
                    product_id: product.id,
                    name: product.name.clone(),
                    unit_price: product.price,
                    quantity,
                    line_total: product.price * quantity as i64,
                }
            })
            .collect()
    }
}

const STATUS_WEIGHTS: [(OrderStatus, f64); 5] = [
    (OrderStatus::Pending, 0.15),
    (OrderStatus::Confirmed, 0.20),
    (OrderStatus::Shipped, 0.20),
    (OrderStatus::Delivered, 0.40),
    (OrderStatus::Cancelled, 0.05),
];

#[async_trait]
impl ModuleSeeder for OrderSeeder {
    fn module_key(&self) -> &'static str {
        keys::ORDERS
    }

    fn dependencies(&self) -> Vec<SeedDependency> {
        vec![
            SeedDependency::required(keys::PRODUCTS, 1),
            SeedDependency::required(keys::CUSTOMERS, 1),
        ]
    }

    async fn pre_seed(&mut self, store: &dyn Store, _quantity: u32) -> Result<(), SeedError> {
        for dep in self.dependencies() {
            require_records(store, keys::ORDERS, &dep).await?;
        }

        let products_table = registry::find(keys::PRODUCTS).unwrap().table;
        self.products = store
            .query(products_table, Filter::All)
            .await?
            .iter()
            .filter_map(|doc| {
                Some(ProductRef {
                    id: doc_id(doc)?,
                    name: doc.get("name")?.as_str()?.to_string(),
                    price: doc.get("price")?.as_i64()?,
                })
            })
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
        let code = self
            .codes
            .claim(&format!("ORD-{:06}", rng.gen_range(0..1_000_000)))?;
        let customer_id = self.customer_ids[rng.gen_range(0..self.customer_ids.len())];

        let items = self.generate_items(rng);
        let subtotal: i64 = items.iter().map(|item| item.line_total).sum();
        let discount = if rng.gen_bool(self.config.discount_probability) {
            subtotal * rng.gen_range(5..=15) / 100
        } else {
            0
        };

        let placed_at = OffsetDateTime::now_utc()
            - Duration::days(rng.gen_range(0..self.config.history_days))
            - Duration::minutes(rng.gen_range(0..1440));

        let order = Order {
            id: Uuid::new_v4(),
            code,
            customer_id,
            status: *faker::weighted_choice(&STATUS_WEIGHTS, rng),
            total: subtotal - discount,
            items,
            subtotal,
            discount,
            placed_at,
        };
        to_doc(&order)
    }

    fn validate(&self, candidate: &Document) -> bool {
        let customer_ok = candidate
            .get("customer_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| self.customer_ids.contains(&id));

        let Some(items) = candidate.get("items").and_then(|v| v.as_array()) else {
            return false;
        };
        let items_ok = !items.is_empty()
            && items.iter().all(|item| {
                item.get("product_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .is_some_and(|id| self.products.iter().any(|p| p.id == id))
            });

        let total_ok = candidate
            .get("total")
            .and_then(|v| v.as_i64())
            .is_some_and(|t| t > 0);

        customer_ok && items_ok && total_ok
    }

    /// Recomputes every snapshot customer's order count and spend from the
    /// orders table, including customers that ended up with none.
    async fn post_seed(&self, store: &dyn Store, _inserted: u32) -> Result<(), SeedError> {
        let orders = store.query(tables::ORDERS, Filter::All).await?;

        let mut totals: std::collections::HashMap<Uuid, (u64, i64)> =
            std::collections::HashMap::new();
        for order in &orders {
            let Some(customer_id) = order
                .get("customer_id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            let total = order.get("total").and_then(|v| v.as_i64()).unwrap_or(0);
            let entry = totals.entry(customer_id).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += total;
        }

        for customer_id in &self.customer_ids {
            let (order_count, total_spent) = totals.get(customer_id).copied().unwrap_or((0, 0));
            store
                .patch(
                    tables::CUSTOMERS,
                    *customer_id,
                    json!({ "order_count": order_count, "total_spent": total_spent }),
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeder_with_snapshot() -> OrderSeeder {
        let mut seeder = OrderSeeder::new();
        seeder.products = (0..10)
            .map(|i| ProductRef {
                id: Uuid::new_v4(),
                name: format!("Product {i}"),
                price: 50_000 + i as i64 * 10_000,
            })
            .collect();
        seeder.customer_ids = (0..5).map(|_| Uuid::new_v4()).collect();
        seeder
    }

    #[test]
    fn test_order_totals_are_consistent() {
        let mut seeder = seeder_with_snapshot();
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            assert!(seeder.validate(&doc));

            let items = doc["items"].as_array().unwrap();
            let line_sum: i64 = items.iter().map(|i| i["line_total"].as_i64().unwrap()).sum();
            assert_eq!(doc["subtotal"].as_i64().unwrap(), line_sum);
            assert_eq!(
                doc["total"].as_i64().unwrap(),
                line_sum - doc["discount"].as_i64().unwrap()
            );
        }
    }

    #[test]
    fn test_order_lines_reference_distinct_products() {
        let mut seeder = seeder_with_snapshot();
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let doc = seeder.generate_one(&mut rng).unwrap();
            let items = doc["items"].as_array().unwrap();
            let mut ids: Vec<&str> =
                items.iter().map(|i| i["product_id"].as_str().unwrap()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), items.len());
        }
    }
}
