//! Core engine for the shopfront admin platform.
//!
//! This crate owns the pieces the data-management surface is built on:
//! the static module registry with its dependency graph, the enable/disable
//! toggle engine with cascade handling, the record shapes every module
//! persists, and the document store seam (`Store`) with in-memory and
//! Postgres implementations.
//!
//! Seeding itself lives in the `demo-data` crate, which drives this one.

pub mod models;
pub mod modules;
pub mod store;

pub use models::ModuleState;
pub use modules::graph::ModuleSet;
pub use modules::registry::{DependencyMode, ModuleCategory, ModuleDef};
pub use store::{Document, Filter, MemoryStore, PgStore, Store, StoreError};
