//! Static module declarations.
//!
//! Declaration order is load-bearing: the dependency resolver uses it as the
//! tie-break between independent modules, which keeps seed runs reproducible.

use serde::{Deserialize, Serialize};

use crate::store::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleCategory {
    Content,
    Commerce,
    User,
    System,
    Marketing,
}

impl ModuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleCategory::Content => "content",
            ModuleCategory::Commerce => "commerce",
            ModuleCategory::User => "user",
            ModuleCategory::System => "system",
            ModuleCategory::Marketing => "marketing",
        }
    }
}

/// How a module's dependency list is evaluated against enabled flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyMode {
    /// Every listed dependency must be enabled.
    All,
    /// At least one listed dependency must be enabled.
    Any,
}

#[derive(Debug, Clone)]
pub struct ModuleDef {
    pub key: &'static str,
    pub name: &'static str,
    pub category: ModuleCategory,
    /// Store table holding this module's records.
    pub table: &'static str,
    /// Core modules are always enabled and are never cascade targets.
    pub is_core: bool,
    pub depends_on: &'static [&'static str],
    pub mode: DependencyMode,
    /// Record count used when a dependency is pulled into a seed run the
    /// operator did not request explicitly.
    pub default_count: u32,
}

pub mod keys {
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

static REGISTRY: [ModuleDef; 11] = [
    ModuleDef {
        key: keys::SETTINGS,
        name: "Settings",
        category: ModuleCategory::System,
        table: tables::SETTINGS,
        is_core: true,
        depends_on: &[],
        mode: DependencyMode::All,
        default_count: 0,
    },
    ModuleDef {
        key: keys::PAGES,
        name: "Pages",
        category: ModuleCategory::Content,
        table: tables::PAGES,
        is_core: false,
        depends_on: &[],
        mode: DependencyMode::All,
        default_count: 5,
    },
    ModuleDef {
        key: keys::POST_CATEGORIES,
        name: "Post categories",
        category: ModuleCategory::Content,
        table: tables::POST_CATEGORIES,
        is_core: false,
        depends_on: &[],
        mode: DependencyMode::All,
        default_count: 5,
    },
    ModuleDef {
        key: keys::POSTS,
        name: "Posts",
        category: ModuleCategory::Content,
        table: tables::POSTS,
        is_core: false,
        depends_on: &[keys::POST_CATEGORIES],
        mode: DependencyMode::All,
        default_count: 20,
    },
    ModuleDef {
        key: keys::PRODUCT_CATEGORIES,
        name: "Product categories",
        category: ModuleCategory::Commerce,
        table: tables::PRODUCT_CATEGORIES,
        is_core: false,
        depends_on: &[],
        mode: DependencyMode::All,
        default_count: 6,
    },
    ModuleDef {
        key: keys::PRODUCTS,
        name: "Products",
        category: ModuleCategory::Commerce,
        table: tables::PRODUCTS,
        is_core: false,
        depends_on: &[keys::PRODUCT_CATEGORIES],
        mode: DependencyMode::All,
        default_count: 30,
    },
    ModuleDef {
        key: keys::CUSTOMERS,
        name: "Customers",
        category: ModuleCategory::User,
        table: tables::CUSTOMERS,
        is_core: false,
        depends_on: &[],
        mode: DependencyMode::All,
        default_count: 25,
    },
    ModuleDef {
        key: keys::ORDERS,
        name: "Orders",
        category: ModuleCategory::Commerce,
        table: tables::ORDERS,
        is_core: false,
        depends_on: &[keys::PRODUCTS, keys::CUSTOMERS],
        mode: DependencyMode::All,
        default_count: 40,
    },
    ModuleDef {
        key: keys::REVIEWS,
        name: "Reviews",
        category: ModuleCategory::Commerce,
        table: tables::REVIEWS,
        is_core: false,
        depends_on: &[keys::PRODUCTS, keys::CUSTOMERS],
        mode: DependencyMode::All,
        default_count: 60,
    },
    ModuleDef {
        key: keys::PROMOTIONS,
        name: "Promotions",
        category: ModuleCategory::Marketing,
        table: tables::PROMOTIONS,
        is_core: false,
        depends_on: &[keys::PRODUCTS],
        mode: DependencyMode::All,
        default_count: 8,
    },
    ModuleDef {
        key: keys::BANNERS,
        name: "Banners",
        category: ModuleCategory::Marketing,
        table: tables::BANNERS,
        is_core: false,
        depends_on: &[keys::POSTS, keys::PRODUCTS],
        mode: DependencyMode::Any,
        default_count: 6,
    },
];

/// All module declarations, in declaration order.
pub fn all() -> &'static [ModuleDef] {
    &REGISTRY
}

pub fn find(key: &str) -> Option<&'static ModuleDef> {
    REGISTRY.iter().find(|def| def.key == key)
}

/// Position in declaration order, used as the resolver tie-break.
pub fn position(key: &str) -> Option<usize> {
    REGISTRY.iter().position(|def| def.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for def in all() {
            assert!(seen.insert(def.key), "duplicate module key {}", def.key);
        }
    }

    #[test]
    fn test_core_modules_have_no_dependencies() {
        for def in all().iter().filter(|d| d.is_core) {
            assert!(def.depends_on.is_empty());
        }
    }
}
