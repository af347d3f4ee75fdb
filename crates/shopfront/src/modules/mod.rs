//! Module registry, dependency graph, and toggle engine.
//!
//! A module is a toggleable unit of platform functionality (posts, products,
//! orders, ...). Declarations are static and ordered; the only runtime state
//! is each module's `enabled` flag, persisted through the document store.

pub mod graph;
pub mod registry;
pub mod toggle;

pub use graph::{GraphError, ModuleSet};
pub use registry::{DependencyMode, ModuleCategory, ModuleDef, keys};
pub use toggle::{ToggleEngine, ToggleError};
