//! Enable/disable state machine for modules.
//!
//! Every operation reads the current enabled flags from the store, computes
//! against that snapshot, and writes the new flags back. Disabling a module
//! that other enabled modules depend on requires the caller to acknowledge
//! the cascade set first; the engine then disables the whole set.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::graph::{self, GraphError, ModuleSet};
use super::registry::{self, ModuleDef};
use crate::models::ModuleState;
use crate::store::{Filter, Store, StoreError, doc_id, tables};

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("core module '{0}' cannot be disabled")]
    CoreModuleLocked(String),

    #[error("module '{module}' is missing required dependency '{missing}'")]
    UnsatisfiedDependency { module: String, missing: String },

    /// Disabling would strand the listed modules; the caller must re-invoke
    /// with this set acknowledged before anything changes.
    #[error("disabling would also disable dependent modules: {}", .0.join(", "))]
    CascadeConfirmationRequired(Vec<String>),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Installs the declaration defaults into an empty `modules` table: core
/// modules enabled, everything else disabled. Also used by the factory
/// reset baseline, which bootstraps the very data the graph depends on.
pub async fn install_module_defaults(store: &dyn Store) -> Result<ModuleSet, StoreError> {
    let mut state = ModuleSet::new();
    for def in registry::all() {
        let record = ModuleState {
            key: def.key.to_string(),
            enabled: def.is_core,
        };
        store
            .insert(tables::MODULES, serde_json::to_value(&record)?)
            .await?;
        state.set(def.key, def.is_core);
    }
    info!("Installed module registry defaults");
    Ok(state)
}

pub struct ToggleEngine {
    store: Arc<dyn Store>,
}

impl ToggleEngine {
    /// Validates the static registry up front so a declaration cycle fails
    /// here, not mid-operation against live data.
    pub fn new(store: Arc<dyn Store>) -> Result<Self, GraphError> {
        graph::validate_registry(registry::all())?;
        Ok(Self { store })
    }

    /// Loads the persisted enabled flags, installing declaration defaults on
    /// first use against an empty store.
    pub async fn load_state(&self) -> Result<ModuleSet, ToggleError> {
        let docs = self.store.query(tables::MODULES, Filter::All).await?;
        if docs.is_empty() {
            return Ok(install_module_defaults(self.store.as_ref()).await?);
        }

        let mut state = ModuleSet::new();
        for doc in docs {
            let record: ModuleState =
                serde_json::from_value(doc).map_err(StoreError::Serialization)?;
            state.set(&record.key, record.enabled);
        }
        Ok(state)
    }

    /// Enables one module. Fails if its dependency list is not satisfied by
    /// the currently enabled set. Enabling an enabled module is a no-op.
    pub async fn enable(&self, key: &str) -> Result<(), ToggleError> {
        let def = find(key)?;
        let state = self.load_state().await?;
        if state.is_enabled(key) {
            return Ok(());
        }

        if !graph::is_satisfied(def, &state) {
            return Err(ToggleError::UnsatisfiedDependency {
                module: key.to_string(),
                missing: missing_dependencies(def, &state),
            });
        }

        self.write_enabled(key, true).await?;
        info!(module = key, "Module enabled");
        Ok(())
    }

    /// Enables a set of modules dependencies-first. Pending dependencies of
    /// the requested set are enabled too. Returns the order that was applied.
    pub async fn enable_many(&self, keys: &[&str]) -> Result<Vec<String>, ToggleError> {
        let requested: BTreeSet<String> = keys.iter().map(|k| k.to_string()).collect();
        let state = self.load_state().await?;
        let order = graph::resolve_order(&requested, registry::all(), &state)?;
        for key in &order {
            self.enable(key).await?;
        }
        Ok(order)
    }

    /// Disables one module, provided nothing enabled depends on it. If
    /// enabled dependents exist the call changes nothing and returns the
    /// cascade set for the operator to confirm.
    pub async fn disable(&self, key: &str) -> Result<(), ToggleError> {
        let def = find(key)?;
        if def.is_core {
            return Err(ToggleError::CoreModuleLocked(key.to_string()));
        }

        let state = self.load_state().await?;
        if !state.is_enabled(key) {
            return Ok(());
        }

        let targets = graph::cascade_targets(key, registry::all(), &state);
        if !targets.is_empty() {
            return Err(ToggleError::CascadeConfirmationRequired(
                targets.iter().map(|d| d.key.to_string()).collect(),
            ));
        }

        self.write_enabled(key, false).await?;
        info!(module = key, "Module disabled");
        Ok(())
    }

    /// Disables `key` and every transitive enabled dependent, after the
    /// caller has acknowledged the cascade set from a prior [`disable`]
    /// call. An acknowledgement that no longer covers the computed set is
    /// rejected with the current set, unchanged state.
    ///
    /// [`disable`]: ToggleEngine::disable
    pub async fn disable_with_cascade(
        &self,
        key: &str,
        acknowledged: &[String],
    ) -> Result<Vec<String>, ToggleError> {
        let def = find(key)?;
        if def.is_core {
            return Err(ToggleError::CoreModuleLocked(key.to_string()));
        }

        let state = self.load_state().await?;
        if !state.is_enabled(key) {
            return Ok(Vec::new());
        }

        let cascade = collect_cascade(key, &state);
        for member in &cascade {
            if !acknowledged.contains(member) {
                return Err(ToggleError::CascadeConfirmationRequired(cascade));
            }
        }

        // Deepest dependents first, the requested module last.
        for member in cascade.iter().rev() {
            self.write_enabled(member, false).await?;
        }
        self.write_enabled(key, false).await?;

        if !cascade.is_empty() {
            warn!(
                module = key,
                cascaded = cascade.len(),
                "Module disabled with cascade"
            );
        } else {
            info!(module = key, "Module disabled");
        }
        Ok(cascade)
    }

    async fn write_enabled(&self, key: &str, enabled: bool) -> Result<(), ToggleError> {
        let docs = self
            .store
            .query(tables::MODULES, Filter::field("key", key))
            .await?;

        match docs.first().and_then(doc_id) {
            Some(id) => {
                self.store
                    .patch(
                        tables::MODULES,
                        id,
                        serde_json::json!({ "enabled": enabled }),
                    )
                    .await?;
            }
            None => {
                let record = ModuleState {
                    key: key.to_string(),
                    enabled,
                };
                self.store
                    .insert(
                        tables::MODULES,
                        serde_json::to_value(&record).map_err(StoreError::Serialization)?,
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

fn find(key: &str) -> Result<&'static ModuleDef, ToggleError> {
    registry::find(key).ok_or_else(|| ToggleError::UnknownModule(key.to_string()))
}

fn missing_dependencies(def: &ModuleDef, state: &ModuleSet) -> String {
    let missing: Vec<&str> = def
        .depends_on
        .iter()
        .filter(|dep| !state.is_enabled(dep))
        .copied()
        .collect();
    missing.join(", ")
}

/// Transitive enabled dependents of `key`, in registry declaration order.
/// The visited set keeps the walk cycle-safe even if the declarations were
/// somehow cyclic at this point.
fn collect_cascade(key: &str, state: &ModuleSet) -> Vec<String> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    visited.insert(key);

    let mut cascade = Vec::new();
    let mut frontier = vec![key];
    while let Some(current) = frontier.pop() {
        for def in graph::cascade_targets(current, registry::all(), state) {
            if visited.insert(def.key) {
                cascade.push(def.key.to_string());
                frontier.push(def.key);
            }
        }
    }

    // Deterministic output regardless of traversal order.
    cascade.sort_by_key(|k| registry::position(k));
    cascade
}
