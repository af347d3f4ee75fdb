//! Factory reset as a caller-driven step function.
//!
//! The reset can exceed a single request's time budget, so it is not one
//! long call: each `step` clears a bounded slice of work and returns a
//! progress cursor, and the caller re-invokes with that cursor until done.
//! Not re-invoking simply halts progress; completed steps are never rolled
//! back.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::presets;
use crate::seeders::SeedError;
use shopfront::models::Setting;
use shopfront::modules::toggle::install_module_defaults;
use shopfront::store::{Filter, Store, StoreError, doc_id, tables};

/// Tables swept by a factory reset. Order matters: dependents go before the
/// rows they reference, system tables last.
const RESET_TABLES: [&str; 13] = [
    tables::BANNERS,
    tables::PROMOTIONS,
    tables::REVIEWS,
    tables::ORDERS,
    tables::PRODUCTS,
    tables::PRODUCT_CATEGORIES,
    tables::POSTS,
    tables::POST_CATEGORIES,
    tables::PAGES,
    tables::CUSTOMERS,
    tables::PRESETS,
    tables::SETTINGS,
    tables::MODULES,
];

/// Baseline restore phase, in fixed declared order. Not derived from the
/// dependency graph, since this bootstraps the very data the graph depends on.
const BASELINE_STEPS: [&str; 3] = [
    "module registry defaults",
    "built-in presets",
    "settings skeleton",
];

/// Both bounds are operational knobs, not load-bearing constants.
#[derive(Debug, Clone, Copy)]
pub struct ResetConfig {
    /// Rows deleted per step within one table.
    pub rows_per_step: usize,
    /// Iteration cap for the driving loop; a fallback against a
    /// misbehaving step implementation, not an expected path.
    pub max_iterations: usize,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            rows_per_step: 500,
            max_iterations: 10_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResetError {
    /// Fatal: the driving loop ran away. Surfaced as an operational failure
    /// requiring investigation, never retried automatically.
    #[error("factory reset exceeded the safety limit of {iterations} iterations")]
    SafetyLimitExceeded { iterations: usize },

    #[error("invalid reset step index {index} (total steps: {total})")]
    InvalidStep { index: usize, total: usize },

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Progress cursor returned by each step. Transient: the caller re-supplies
/// `next_index` to resume, including after a disconnect.
#[derive(Debug, Clone, Serialize)]
pub struct ResetProgress {
    pub current_index: usize,
    /// Index to re-invoke with; `None` signals completion. A step that did
    /// not finish its table returns its own index again.
    pub next_index: Option<usize>,
    pub total_steps: usize,
    /// Human-readable label of current activity, for the caller to render.
    pub label: String,
    /// True only on the final step of the whole reset.
    pub completed: bool,
}

pub struct ResetStepper {
    store: Arc<dyn Store>,
    config: ResetConfig,
}

impl ResetStepper {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            config: ResetConfig::default(),
        }
    }

    pub fn with_config(self, config: ResetConfig) -> Self {
        Self { config, ..self }
    }

    pub fn total_steps(&self) -> usize {
        RESET_TABLES.len() + BASELINE_STEPS.len()
    }

    /// Executes one bounded unit of the reset: a slice of deletes in the
    /// current table, or one baseline restore action once every table is
    /// empty.
    pub async fn step(&self, current_index: usize) -> Result<ResetProgress, ResetError> {
        let total = self.total_steps();
        if current_index >= total {
            return Err(ResetError::InvalidStep {
                index: current_index,
                total,
            });
        }

        if current_index < RESET_TABLES.len() {
            return self.clear_step(current_index, total).await;
        }
        self.baseline_step(current_index, total).await
    }

    async fn clear_step(
        &self,
        current_index: usize,
        total: usize,
    ) -> Result<ResetProgress, ResetError> {
        let table = RESET_TABLES[current_index];

        let docs = self.store.query(table, Filter::All).await?;
        for doc in docs.iter().take(self.config.rows_per_step) {
            if let Some(id) = doc_id(doc) {
                self.store.delete(table, id).await?;
            }
        }

        let remaining = self.store.count(table, Filter::All).await?;
        if remaining > 0 {
            // Same index again: the caller keeps re-invoking until the
            // table reports empty.
            debug!(table, remaining, "Table not yet empty, staying on step");
            return Ok(ResetProgress {
                current_index,
                next_index: Some(current_index),
                total_steps: total,
                label: format!("Clearing {table} ({remaining} rows remaining)"),
                completed: false,
            });
        }

        info!("Cleared table {}", table);
        Ok(ResetProgress {
            current_index,
            next_index: Some(current_index + 1),
            total_steps: total,
            label: format!("Cleared {table}"),
            completed: false,
        })
    }

    async fn baseline_step(
        &self,
        current_index: usize,
        total: usize,
    ) -> Result<ResetProgress, ResetError> {
        let baseline_index = current_index - RESET_TABLES.len();
        match baseline_index {
            0 => {
                install_module_defaults(self.store.as_ref()).await?;
            }
            1 => {
                presets::install_builtin(self.store.as_ref()).await?;
            }
            _ => {
                self.install_settings_skeleton().await?;
            }
        }

        let next = current_index + 1;
        if next >= total {
            info!("Factory reset complete");
            return Ok(ResetProgress {
                current_index,
                next_index: None,
                total_steps: total,
                label: "Factory reset complete".to_string(),
                completed: true,
            });
        }
        Ok(ResetProgress {
            current_index,
            next_index: Some(next),
            total_steps: total,
            label: format!("Restored {}", BASELINE_STEPS[baseline_index]),
            completed: false,
        })
    }

    async fn install_settings_skeleton(&self) -> Result<(), StoreError> {
        let defaults = [
            ("site_name", serde_json::json!("Shopfront")),
            ("currency", serde_json::json!("VND")),
            ("locale", serde_json::json!("vi-VN")),
            ("items_per_page", serde_json::json!(24)),
            ("maintenance_mode", serde_json::json!(false)),
        ];

        for (key, value) in defaults {
            let setting = Setting {
                key: key.to_string(),
                value,
            };
            self.store
                .insert(tables::SETTINGS, serde_json::to_value(&setting)?)
                .await?;
        }
        info!("Installed settings skeleton");
        Ok(())
    }

    /// Drives `step` from index 0 to completion. Returns the number of
    /// iterations taken. The iteration cap is a correctness fallback
    /// against an infinite loop in a misbehaving step implementation.
    pub async fn run_to_completion(&self) -> Result<usize, ResetError> {
        let mut index = 0;
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(ResetError::SafetyLimitExceeded {
                    iterations: self.config.max_iterations,
                });
            }

            let progress = self.step(index).await?;
            info!(
                "[{}/{}] {}",
                progress.current_index + 1,
                progress.total_steps,
                progress.label
            );
            match progress.next_index {
                Some(next) => index = next,
                None => return Ok(iterations),
            }
        }
    }
}
