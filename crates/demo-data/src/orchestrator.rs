//! Seed orchestration across modules.
//!
//! One orchestrator call is one synchronous unit of work: resolve the
//! dependency-correct order, run each module's seeder in turn, aggregate
//! counts and errors. Sequential on purpose: later seeders read records
//! produced by earlier ones, so write order is the correctness invariant.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_BATCH_SIZE, SeedConfig};
use crate::presets;
use crate::seeders::{SeedError, SeederRegistry};
use shopfront::modules::graph::{self, GraphError};
use shopfront::modules::registry;
use shopfront::modules::toggle::ToggleEngine;
use shopfront::store::{Filter, Store, doc_id};

/// Counts for one module's seed run. `inserted` is what was actually
/// persisted, which may fall short of `requested` when unique-key or
/// validation bounds were hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub requested: u32,
    pub inserted: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleSeedStatus {
    Seeded(SeedOutcome),
    /// A required dependency failed earlier in the same bulk run, so this
    /// module was not attempted.
    DependencySkipped { missing: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSeedResult {
    pub module: String,
    pub status: ModuleSeedStatus,
}

/// Per-module results of a bulk run, in execution order.
#[derive(Debug, Default, Serialize)]
pub struct BulkSeedReport {
    pub results: Vec<ModuleSeedResult>,
}

impl BulkSeedReport {
    pub fn total_inserted(&self) -> u32 {
        self.results
            .iter()
            .map(|r| match r.status {
                ModuleSeedStatus::Seeded(outcome) => outcome.inserted,
                _ => 0,
            })
            .sum()
    }

    pub fn status_of(&self, module: &str) -> Option<&ModuleSeedStatus> {
        self.results
            .iter()
            .find(|r| r.module == module)
            .map(|r| &r.status)
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| !matches!(r.status, ModuleSeedStatus::Seeded(_)))
    }
}

pub struct SeedOrchestrator {
    store: Arc<dyn Store>,
    toggles: ToggleEngine,
    batch_size: usize,
    rng: StdRng,
}

impl SeedOrchestrator {
    /// Fails here if the static module declarations are invalid, so a
    /// registry cycle never reaches live data.
    pub fn new(store: Arc<dyn Store>) -> Result<Self, GraphError> {
        let toggles = ToggleEngine::new(store.clone())?;
        Ok(Self {
            store,
            toggles,
            batch_size: DEFAULT_BATCH_SIZE,
            rng: StdRng::seed_from_u64(42),
        })
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Fixes the RNG seed so a demo environment can be regenerated.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn toggles(&self) -> &ToggleEngine {
        &self.toggles
    }

    /// Seeds one module. With `force` off and records already present this
    /// is an idempotent no-op returning `inserted = 0`.
    ///
    /// Record-level failures (unique-key exhaustion, validation, a failed
    /// individual insert) are absorbed into the skip counter; only
    /// module-level failures surface as errors.
    pub async fn seed_module(
        &mut self,
        key: &str,
        quantity: u32,
        force: bool,
    ) -> Result<SeedOutcome, SeedError> {
        let def =
            registry::find(key).ok_or_else(|| SeedError::UnknownModule(key.to_string()))?;
        let mut seeder = SeederRegistry::create(key)
            .ok_or_else(|| SeedError::UnknownModule(key.to_string()))?;

        if !force && self.store.count(def.table, Filter::All).await? > 0 {
            debug!(module = key, "Records already present, skipping seed");
            return Ok(SeedOutcome {
                requested: quantity,
                inserted: 0,
                skipped: 0,
            });
        }

        seeder.pre_seed(self.store.as_ref(), quantity).await?;

        info!("Seeding {} {}...", quantity, key);
        let mut inserted = 0u32;
        let mut skipped = 0u32;
        let mut produced = 0u32;

        while produced < quantity {
            let batch_end = quantity.min(produced + self.batch_size as u32);
            for _ in produced..batch_end {
                match seeder.generate_one(&mut self.rng) {
                    Ok(candidate) => {
                        if !seeder.validate(&candidate) {
                            skipped += 1;
                            warn!(module = key, "Generated record failed validation, skipped");
                            continue;
                        }
                        // Individual inserts: partial success must be
                        // tolerated without rolling back earlier records.
                        match self.store.insert(def.table, candidate).await {
                            Ok(_) => inserted += 1,
                            Err(err) => {
                                skipped += 1;
                                warn!(module = key, error = %err, "Insert failed, record skipped");
                            }
                        }
                    }
                    Err(SeedError::UniqueKey(err)) => {
                        skipped += 1;
                        warn!(module = key, error = %err, "Record skipped");
                    }
                    Err(err) => return Err(err),
                }
            }
            produced = batch_end;
            if produced < quantity {
                info!("  Seeded {}/{} {}", inserted, quantity, key);
            }
        }

        seeder.post_seed(self.store.as_ref(), inserted).await?;
        info!("Seeded {} {} ({} skipped)", inserted, key, skipped);
        Ok(SeedOutcome {
            requested: quantity,
            inserted,
            skipped,
        })
    }

    /// Seeds several modules in one dependency-correct pass.
    ///
    /// Pending dependencies the operator did not request are pulled into the
    /// order and seeded with their registry default counts. Execution is
    /// best-effort: a module's failure is recorded and its siblings
    /// continue, but modules whose required dependency failed in this run
    /// are skipped rather than attempted.
    pub async fn seed_bulk(&mut self, configs: &[SeedConfig]) -> Result<BulkSeedReport, SeedError> {
        let mut report = BulkSeedReport::default();

        let mut requested: BTreeSet<String> = BTreeSet::new();
        let mut settings: HashMap<String, (u32, bool)> = HashMap::new();
        for config in configs {
            if !SeederRegistry::is_seedable(&config.module) {
                report.results.push(ModuleSeedResult {
                    module: config.module.clone(),
                    status: ModuleSeedStatus::Failed {
                        error: SeedError::UnknownModule(config.module.clone()).to_string(),
                    },
                });
                continue;
            }
            requested.insert(config.module.clone());
            settings.insert(config.module.clone(), (config.quantity, config.force));
        }

        let state = self.toggles.load_state().await?;
        let order = graph::resolve_order(&requested, registry::all(), &state)?;

        let mut failed: BTreeSet<String> = BTreeSet::new();
        for key in &order {
            let Some(def) = registry::find(key) else {
                continue;
            };
            let Some(probe) = SeederRegistry::create(key) else {
                continue;
            };

            let deps = probe.dependencies();
            if let Some(missing) = deps.iter().find(|d| d.required && failed.contains(d.module)) {
                warn!(
                    module = %key,
                    missing = missing.module,
                    "Skipping module, required dependency failed in this run"
                );
                failed.insert(key.clone());
                report.results.push(ModuleSeedResult {
                    module: key.clone(),
                    status: ModuleSeedStatus::DependencySkipped {
                        missing: missing.module.to_string(),
                    },
                });
                continue;
            }

            let (quantity, force) = settings
                .get(key)
                .copied()
                .unwrap_or((def.default_count, false));

            match self.seed_module(key, quantity, force).await {
                Ok(outcome) => report.results.push(ModuleSeedResult {
                    module: key.clone(),
                    status: ModuleSeedStatus::Seeded(outcome),
                }),
                Err(err) => {
                    warn!(module = %key, error = %err, "Module seed failed");
                    failed.insert(key.clone());
                    report.results.push(ModuleSeedResult {
                        module: key.clone(),
                        status: ModuleSeedStatus::Failed {
                            error: err.to_string(),
                        },
                    });
                }
            }
        }

        Ok(report)
    }

    /// Expands a preset: enables its modules dependency-first, then bulk
    /// seeds them with the preset's quantities.
    pub async fn apply_preset(&mut self, preset_key: &str) -> Result<BulkSeedReport, SeedError> {
        let preset = presets::load(self.store.as_ref(), preset_key)
            .await?
            .ok_or_else(|| SeedError::UnknownPreset(preset_key.to_string()))?;
        info!("Applying preset '{}'", preset.name);

        let keys: Vec<&str> = preset.entries.iter().map(|e| e.module.as_str()).collect();
        self.toggles.enable_many(&keys).await?;

        let configs: Vec<SeedConfig> = preset
            .entries
            .iter()
            .map(|e| SeedConfig::new(e.module.clone(), e.quantity))
            .collect();
        self.seed_bulk(&configs).await
    }

    /// Deletes all records of one module's table. Callers clearing several
    /// modules are responsible for dependency-reverse order; see
    /// [`clear_all`](SeedOrchestrator::clear_all).
    pub async fn clear_module(&mut self, key: &str) -> Result<u64, SeedError> {
        let def =
            registry::find(key).ok_or_else(|| SeedError::UnknownModule(key.to_string()))?;

        let docs = self.store.query(def.table, Filter::All).await?;
        let mut deleted = 0u64;
        for doc in &docs {
            if let Some(id) = doc_id(doc)
                && self.store.delete(def.table, id).await?
            {
                deleted += 1;
            }
        }
        info!("Cleared {} records from {}", deleted, key);
        Ok(deleted)
    }

    /// Clears every seedable module dependents-first, the mirror image of
    /// seed order, so a dependency's rows are never deleted while rows
    /// referencing them still exist.
    pub async fn clear_all(&mut self) -> Result<Vec<(String, u64)>, SeedError> {
        let requested: BTreeSet<String> = SeederRegistry::seedable_keys()
            .iter()
            .map(|k| k.to_string())
            .collect();
        let state = self.toggles.load_state().await?;
        let order = graph::resolve_order(&requested, registry::all(), &state)?;

        let mut counts = Vec::with_capacity(order.len());
        for key in order.iter().rev() {
            let deleted = self.clear_module(key).await?;
            counts.push((key.clone(), deleted));
        }
        Ok(counts)
    }
}
