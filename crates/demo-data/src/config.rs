//! Configuration types for seeding operations.

use serde::{Deserialize, Serialize};

/// Default number of records generated and persisted per batch. Bounds
/// memory and gives the orchestrator a progress checkpoint.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// One requested unit of seeding. Ephemeral: constructed per orchestration
/// call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Target module key.
    pub module: String,
    /// Desired record quantity.
    pub quantity: u32,
    /// Re-seed even if the module already has records.
    pub force: bool,
    /// Optional module-specific variant (e.g. a named sub-preset).
    pub variant: Option<String>,
}

impl SeedConfig {
    pub fn new(module: impl Into<String>, quantity: u32) -> Self {
        Self {
            module: module.into(),
            quantity,
            force: false,
            variant: None,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}
