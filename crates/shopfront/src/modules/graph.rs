//! Dependency resolution over the static module registry.
//!
//! Answers two questions: in what order may a set of modules be processed,
//! and which enabled modules would be stranded by disabling a given one.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::registry::{DependencyMode, ModuleDef};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Configuration error in the static declarations. Must surface at
    /// startup/validation time, never against live data.
    #[error("dependency cycle detected at module '{module}'")]
    CycleDetected { module: String },

    #[error("unknown module '{module}'")]
    UnknownModule { module: String },
}

/// Snapshot of every module's `enabled` flag, loaded from the store for one
/// call. There is no ambient "currently enabled" singleton; callers pass
/// this in explicitly.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    enabled: BTreeSet<String>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_enabled(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled: keys.into_iter().collect(),
        }
    }

    pub fn set(&mut self, key: &str, enabled: bool) {
        if enabled {
            self.enabled.insert(key.to_string());
        } else {
            self.enabled.remove(key);
        }
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.enabled.contains(key)
    }

    pub fn enabled_keys(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}

/// Three-color marking for the depth-first visit: absent = unvisited.
#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

fn lookup<'a>(defs: &'a [ModuleDef], key: &str) -> Result<&'a ModuleDef, GraphError> {
    defs.iter()
        .find(|def| def.key == key)
        .ok_or_else(|| GraphError::UnknownModule {
            module: key.to_string(),
        })
}

fn visit(
    key: &str,
    defs: &[ModuleDef],
    settled: Option<(&BTreeSet<String>, &ModuleSet)>,
    marks: &mut HashMap<String, Mark>,
    order: &mut Vec<String>,
) -> Result<(), GraphError> {
    match marks.get(key) {
        Some(Mark::InProgress) => {
            return Err(GraphError::CycleDetected {
                module: key.to_string(),
            });
        }
        Some(Mark::Done) => return Ok(()),
        None => {}
    }
    marks.insert(key.to_string(), Mark::InProgress);

    let def = lookup(defs, key)?;
    for dep in def.depends_on {
        // An already-enabled dependency that was not explicitly requested is
        // settled; a still-pending one is inserted ahead of its dependents.
        if let Some((requested, enabled)) = settled
            && enabled.is_enabled(dep)
            && !requested.contains(*dep)
        {
            continue;
        }
        visit(dep, defs, settled, marks, order)?;
    }

    marks.insert(key.to_string(), Mark::Done);
    order.push(key.to_string());
    Ok(())
}

/// Topological order over `requested` plus their pending transitive
/// dependencies. Ties between independent modules break by declaration
/// order in `defs`, so the result is deterministic.
pub fn resolve_order(
    requested: &BTreeSet<String>,
    defs: &[ModuleDef],
    enabled: &ModuleSet,
) -> Result<Vec<String>, GraphError> {
    for key in requested {
        lookup(defs, key)?;
    }

    let mut marks = HashMap::new();
    let mut order = Vec::new();
    for def in defs {
        if requested.contains(def.key) {
            visit(def.key, defs, Some((requested, enabled)), &mut marks, &mut order)?;
        }
    }
    Ok(order)
}

/// Currently-enabled modules whose dependency list contains `key`.
/// Consulted before a disable to decide whether a cascade confirmation is
/// needed.
pub fn cascade_targets<'a>(
    key: &str,
    defs: &'a [ModuleDef],
    enabled: &ModuleSet,
) -> Vec<&'a ModuleDef> {
    defs.iter()
        .filter(|def| enabled.is_enabled(def.key) && def.depends_on.contains(&key))
        .collect()
}

/// Evaluates a module's dependency list against current enabled flags.
pub fn is_satisfied(def: &ModuleDef, enabled: &ModuleSet) -> bool {
    if def.is_core || def.depends_on.is_empty() {
        return true;
    }
    match def.mode {
        DependencyMode::All => def.depends_on.iter().all(|dep| enabled.is_enabled(dep)),
        DependencyMode::Any => def.depends_on.iter().any(|dep| enabled.is_enabled(dep)),
    }
}

/// Checks the static declarations: every dependency key must exist and the
/// graph must be acyclic. Engine constructors call this so a bad registry
/// fails loudly before any data is touched.
pub fn validate_registry(defs: &[ModuleDef]) -> Result<(), GraphError> {
    for def in defs {
        for dep in def.depends_on {
            lookup(defs, dep)?;
        }
    }

    let mut marks = HashMap::new();
    let mut order = Vec::new();
    for def in defs {
        visit(def.key, defs, None, &mut marks, &mut order)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::registry::{self, ModuleCategory, keys};

    fn def(
        key: &'static str,
        depends_on: &'static [&'static str],
        mode: DependencyMode,
    ) -> ModuleDef {
        ModuleDef {
            key,
            name: key,
            category: ModuleCategory::Content,
            table: key,
            is_core: false,
            depends_on,
            mode,
            default_count: 1,
        }
    }

    fn requested(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_dependencies_come_before_dependents() {
        let order = resolve_order(
            &requested(&[keys::ORDERS, keys::PRODUCTS, keys::CUSTOMERS]),
            registry::all(),
            &ModuleSet::new(),
        )
        .unwrap();

        let pos = |key: &str| order.iter().position(|k| k == key).unwrap();
        assert!(pos(keys::PRODUCT_CATEGORIES) < pos(keys::PRODUCTS));
        assert!(pos(keys::PRODUCTS) < pos(keys::ORDERS));
        assert!(pos(keys::CUSTOMERS) < pos(keys::ORDERS));
    }

    #[test]
    fn test_pending_dependency_is_inserted() {
        // products was not requested and is not enabled, so it (and its own
        // dependency) must appear ahead of orders.
        let order = resolve_order(
            &requested(&[keys::ORDERS]),
            registry::all(),
            &ModuleSet::new(),
        )
        .unwrap();
        assert_eq!(
            order,
            vec![
                keys::PRODUCT_CATEGORIES,
                keys::PRODUCTS,
                keys::CUSTOMERS,
                keys::ORDERS
            ]
        );
    }

    #[test]
    fn test_enabled_dependency_is_settled() {
        let mut enabled = ModuleSet::new();
        enabled.set(keys::PRODUCT_CATEGORIES, true);
        enabled.set(keys::PRODUCTS, true);
        enabled.set(keys::CUSTOMERS, true);

        let order = resolve_order(&requested(&[keys::ORDERS]), registry::all(), &enabled).unwrap();
        assert_eq!(order, vec![keys::ORDERS]);
    }

    #[test]
    fn test_tie_break_is_declaration_order() {
        // pages, post_categories, and customers are mutually independent;
        // the order must match the registry, not the alphabet.
        let order = resolve_order(
            &requested(&[keys::CUSTOMERS, keys::PAGES, keys::POST_CATEGORIES]),
            registry::all(),
            &ModuleSet::new(),
        )
        .unwrap();
        assert_eq!(order, vec![keys::PAGES, keys::POST_CATEGORIES, keys::CUSTOMERS]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let defs = [
            def("a", &["b"], DependencyMode::All),
            def("b", &["c"], DependencyMode::All),
            def("c", &["a"], DependencyMode::All),
        ];

        let err = resolve_order(&requested(&["a"]), &defs, &ModuleSet::new()).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
        assert!(validate_registry(&defs).is_err());
    }

    #[test]
    fn test_cycle_outside_requested_set_still_fails_validation() {
        let defs = [
            def("standalone", &[], DependencyMode::All),
            def("x", &["y"], DependencyMode::All),
            def("y", &["x"], DependencyMode::All),
        ];

        // Resolution restricted to the standalone module succeeds...
        assert!(resolve_order(&requested(&["standalone"]), &defs, &ModuleSet::new()).is_ok());
        // ...but registry validation catches the cycle up front.
        assert!(matches!(
            validate_registry(&defs),
            Err(GraphError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let err = resolve_order(
            &requested(&["no_such_module"]),
            registry::all(),
            &ModuleSet::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownModule {
                module: "no_such_module".to_string()
            }
        );
    }

    #[test]
    fn test_any_mode_satisfaction() {
        let banners = registry::find(keys::BANNERS).unwrap();
        let mut enabled = ModuleSet::new();
        assert!(!is_satisfied(banners, &enabled));

        enabled.set(keys::PRODUCTS, true);
        assert!(is_satisfied(banners, &enabled));

        let orders = registry::find(keys::ORDERS).unwrap();
        assert!(!is_satisfied(orders, &enabled));
        enabled.set(keys::CUSTOMERS, true);
        assert!(is_satisfied(orders, &enabled));
    }

    #[test]
    fn test_cascade_targets_only_lists_enabled_dependents() {
        let mut enabled = ModuleSet::new();
        enabled.set(keys::PRODUCTS, true);
        enabled.set(keys::ORDERS, true);
        enabled.set(keys::PROMOTIONS, true);
        // reviews depends on products too, but is disabled

        let targets = cascade_targets(keys::PRODUCTS, registry::all(), &enabled);
        let target_keys: Vec<&str> = targets.iter().map(|d| d.key).collect();
        assert_eq!(target_keys, vec![keys::ORDERS, keys::PROMOTIONS]);
    }

    #[test]
    fn test_builtin_registry_is_valid() {
        validate_registry(registry::all()).unwrap();
    }
}
