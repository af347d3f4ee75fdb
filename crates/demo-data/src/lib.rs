//! Demo data generation for shopfront.
//!
//! This crate turns an empty (or partially populated) shopfront store into a
//! plausible demo environment: it enables modules dependency-first, seeds
//! each module's table with generated records whose cross-references are
//! always valid, and can tear everything back down again, including a
//! resumable factory reset.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use demo_data::prelude::*;
//!
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! let mut orchestrator = SeedOrchestrator::new(store)?.with_seed(12345);
//!
//! let report = orchestrator.apply_preset("shop").await?;
//! for result in &report.results {
//!     println!("{}: {:?}", result.module, result.status);
//! }
//! ```

pub mod config;
pub mod faker;
pub mod orchestrator;
pub mod presets;
pub mod reset;
pub mod seeders;

pub use seeders::SeedError;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::orchestrator::{
        BulkSeedReport, ModuleSeedStatus, SeedOrchestrator, SeedOutcome,
    };
    pub use crate::presets;
    pub use crate::reset::{ResetConfig, ResetProgress, ResetStepper};
    pub use crate::seeders::{ModuleSeeder, SeedDependency, SeedError, SeederRegistry};
    pub use shopfront::modules::keys;
    pub use shopfront::store::{MemoryStore, PgStore, Store};
}
