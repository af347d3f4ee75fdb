//! Document store seam.
//!
//! The engine treats persistence as a generic transactional document store:
//! JSON documents in named tables, reachable through read/write/query calls.
//! Nothing here assumes multi-row atomicity; callers that need ordering
//! guarantees (dependency-first seeding, dependent-first clearing) encode
//! them in write order instead.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Table names used by the platform core.
pub mod tables {
    pub const MODULES: &str = "modules";
    pub const PRESETS: &str = "presets";
    pub const SETTINGS: &str = "settings";
    pub const PAGES: &str = "pages";
    pub const POST_CATEGORIES: &str = "post_categories";
    pub const POSTS: &str = "posts";
    pub const PRODUCT_CATEGORIES: &str = "product_categories";
    pub const PRODUCTS: &str = "products";
    pub const CUSTOMERS: &str = "customers";
    pub const ORDERS: &str = "orders";
    pub const REVIEWS: &str = "reviews";
    pub const PROMOTIONS: &str = "promotions";
    pub const BANNERS: &str = "banners";
}

pub type Document = serde_json::Value;

/// Predicate over documents in a table. Kept deliberately small: the engine
/// only ever needs full scans and top-level field equality.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    Eq(&'static str, serde_json::Value),
}

impl Filter {
    pub fn field(name: &'static str, value: impl Into<serde_json::Value>) -> Self {
        Filter::Eq(name, value.into())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(name, value) => doc.get(name) == Some(value),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {table}/{id}")]
    NotFound { table: String, id: Uuid },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Reads the `id` field of a document, if present and well-formed.
pub fn doc_id(doc: &Document) -> Option<Uuid> {
    doc.get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, table: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Inserts a document, assigning a fresh id when the document carries
    /// none. Returns the id under which the document was stored.
    async fn insert(&self, table: &str, doc: Document) -> Result<Uuid, StoreError>;

    /// Shallow-merges `partial`'s top-level fields into an existing document.
    async fn patch(&self, table: &str, id: Uuid, partial: Document) -> Result<(), StoreError>;

    /// Returns whether a document was actually removed.
    async fn delete(&self, table: &str, id: Uuid) -> Result<bool, StoreError>;

    async fn query(&self, table: &str, filter: Filter) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, table: &str, filter: Filter) -> Result<u64, StoreError>;
}

/// Resolves the id a document should be stored under, generating one for
/// documents that carry none. Shared by store implementations.
pub(crate) fn assign_id(doc: &mut Document) -> Uuid {
    if let Some(id) = doc_id(doc) {
        return id;
    }
    let id = Uuid::new_v4();
    if let Some(map) = doc.as_object_mut() {
        map.insert("id".to_string(), serde_json::Value::String(id.to_string()));
    }
    id
}
