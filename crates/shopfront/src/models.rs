use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted on/off flag for one module. The static declaration lives in
/// [`crate::modules::registry`]; only `enabled` ever changes at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleState {
    pub key: String,
    pub enabled: bool,
}

/// Named bundle of modules to enable plus a seeding quantity for each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub key: String,
    pub name: String,
    pub entries: Vec<PresetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetEntry {
    pub module: String,
    pub quantity: u32,
}

/// One row of the settings skeleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub published: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub tags: Vec<String>,
    pub published: bool,
    pub created_at: OffsetDateTime,
}

/// Product category with a denormalized product counter maintained by the
/// product seeder's post-seed pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub product_count: u32,
}

/// Monetary amounts are integer minor units throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub rating_avg: f64,
    pub review_count: u32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub order_count: u32,
    pub total_spent: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub code: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,
    pub placed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub rating: u8,
    pub title: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub percent_off: u8,
    pub product_ids: Vec<Uuid>,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
    pub active: bool,
}

/// What a banner links to. Banners accept either content or commerce
/// targets, which is why the banners module declares an `any` dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum BannerTarget {
    Post(Uuid),
    Product(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub id: Uuid,
    pub title: String,
    pub target: BannerTarget,
    pub position: u32,
    pub active: bool,
    pub created_at: OffsetDateTime,
}
