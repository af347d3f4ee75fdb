//! End-to-end seeding pipeline tests against the in-memory store: bulk
//! ordering and referential integrity, idempotent re-seeds, dependency
//! skips, dependent-first clearing, and the resumable factory reset.

use std::sync::Arc;

use uuid::Uuid;

use demo_data::config::SeedConfig;
use demo_data::orchestrator::{ModuleSeedStatus, SeedOrchestrator};
use demo_data::reset::{ResetConfig, ResetError, ResetStepper};
use demo_data::seeders::SeedError;
use shopfront::modules::keys;
use shopfront::store::{Filter, MemoryStore, Store, tables};

fn setup() -> (Arc<dyn Store>, SeedOrchestrator) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let orchestrator = SeedOrchestrator::new(store.clone()).unwrap().with_seed(7);
    (store, orchestrator)
}

async fn count(store: &Arc<dyn Store>, table: &str) -> u64 {
    store.count(table, Filter::All).await.unwrap()
}

async fn ids_of(store: &Arc<dyn Store>, table: &str) -> Vec<Uuid> {
    store
        .query(table, Filter::All)
        .await
        .unwrap()
        .iter()
        .filter_map(shopfront::store::doc_id)
        .collect()
}

#[tokio::test]
async fn test_bulk_seed_orders_dependencies_and_keeps_references_valid() {
    let (store, mut orchestrator) = setup();

    let configs = vec![
        SeedConfig::new(keys::PRODUCTS, 20),
        SeedConfig::new(keys::PRODUCT_CATEGORIES, 5),
        SeedConfig::new(keys::ORDERS, 10),
        SeedConfig::new(keys::CUSTOMERS, 8),
    ];
    let report = orchestrator.seed_bulk(&configs).await.unwrap();

    // Execution order: categories before products, both before orders;
    // customers before orders.
    let pos = |module: &str| {
        report
            .results
            .iter()
            .position(|r| r.module == module)
            .unwrap_or_else(|| panic!("{module} missing from report"))
    };
    assert!(pos(keys::PRODUCT_CATEGORIES) < pos(keys::PRODUCTS));
    assert!(pos(keys::PRODUCTS) < pos(keys::ORDERS));
    assert!(pos(keys::CUSTOMERS) < pos(keys::ORDERS));

    for result in &report.results {
        assert!(
            matches!(result.status, ModuleSeedStatus::Seeded(_)),
            "{} did not seed: {:?}",
            result.module,
            result.status
        );
    }

    // Every order reference resolves to a record that existed at
    // generation time.
    let product_ids = ids_of(&store, tables::PRODUCTS).await;
    let customer_ids = ids_of(&store, tables::CUSTOMERS).await;
    let orders = store.query(tables::ORDERS, Filter::All).await.unwrap();
    assert_eq!(orders.len(), 10);

    for order in &orders {
        let customer_id =
            Uuid::parse_str(order["customer_id"].as_str().unwrap()).unwrap();
        assert!(customer_ids.contains(&customer_id));

        for item in order["items"].as_array().unwrap() {
            let product_id = Uuid::parse_str(item["product_id"].as_str().unwrap()).unwrap();
            assert!(product_ids.contains(&product_id));
        }
    }
}

#[tokio::test]
async fn test_reseeding_without_force_is_a_no_op() {
    let (store, mut orchestrator) = setup();

    orchestrator
        .seed_bulk(&[
            SeedConfig::new(keys::PRODUCT_CATEGORIES, 5),
            SeedConfig::new(keys::PRODUCTS, 20),
        ])
        .await
        .unwrap();
    let before = count(&store, tables::PRODUCTS).await;
    assert!(before > 0);

    let outcome = orchestrator
        .seed_module(keys::PRODUCTS, 20, false)
        .await
        .unwrap();
    assert_eq!(outcome.inserted, 0);
    assert_eq!(count(&store, tables::PRODUCTS).await, before);

    // With force, records are appended.
    let outcome = orchestrator
        .seed_module(keys::PRODUCTS, 5, true)
        .await
        .unwrap();
    assert!(outcome.inserted > 0);
    assert_eq!(
        count(&store, tables::PRODUCTS).await,
        before + outcome.inserted as u64
    );
}

#[tokio::test]
async fn test_seeding_with_empty_required_dependency_inserts_nothing() {
    let (store, mut orchestrator) = setup();

    let err = orchestrator
        .seed_module(keys::POSTS, 15, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::DependencyUnsatisfied { .. }));
    assert_eq!(count(&store, tables::POSTS).await, 0);
}

#[tokio::test]
async fn test_bulk_seed_skips_dependents_of_a_failed_module() {
    let (store, mut orchestrator) = setup();

    // product_categories is enabled but empty, and not part of the request,
    // so the resolver treats it as settled and products hits its threshold
    // failure. Orders must then be skipped, customers still seeded.
    orchestrator
        .toggles()
        .enable(keys::PRODUCT_CATEGORIES)
        .await
        .unwrap();

    let report = orchestrator
        .seed_bulk(&[
            SeedConfig::new(keys::PRODUCTS, 10),
            SeedConfig::new(keys::ORDERS, 5),
            SeedConfig::new(keys::CUSTOMERS, 4),
        ])
        .await
        .unwrap();

    assert!(matches!(
        report.status_of(keys::PRODUCTS),
        Some(ModuleSeedStatus::Failed { .. })
    ));
    assert!(matches!(
        report.status_of(keys::ORDERS),
        Some(ModuleSeedStatus::DependencySkipped { missing }) if missing == keys::PRODUCTS
    ));
    assert!(matches!(
        report.status_of(keys::CUSTOMERS),
        Some(ModuleSeedStatus::Seeded(outcome)) if outcome.inserted == 4
    ));

    assert_eq!(count(&store, tables::PRODUCTS).await, 0);
    assert_eq!(count(&store, tables::ORDERS).await, 0);
    assert_eq!(count(&store, tables::CUSTOMERS).await, 4);
}

#[tokio::test]
async fn test_unknown_module_is_reported_without_aborting_siblings() {
    let (store, mut orchestrator) = setup();

    let report = orchestrator
        .seed_bulk(&[
            SeedConfig::new("widgets", 10),
            SeedConfig::new(keys::PAGES, 3),
        ])
        .await
        .unwrap();

    assert!(matches!(
        report.status_of("widgets"),
        Some(ModuleSeedStatus::Failed { .. })
    ));
    assert_eq!(count(&store, tables::PAGES).await, 3);
}

#[tokio::test]
async fn test_post_seed_aggregates_are_recomputed() {
    let (store, mut orchestrator) = setup();

    orchestrator.apply_preset("shop").await.unwrap();

    // Category counters must sum to the number of products.
    let categories = store
        .query(tables::PRODUCT_CATEGORIES, Filter::All)
        .await
        .unwrap();
    let counted: u64 = categories
        .iter()
        .map(|c| c["product_count"].as_u64().unwrap())
        .sum();
    assert_eq!(counted, count(&store, tables::PRODUCTS).await);

    // Customer order counters must sum to the number of orders.
    let customers = store.query(tables::CUSTOMERS, Filter::All).await.unwrap();
    let order_total: u64 = customers
        .iter()
        .map(|c| c["order_count"].as_u64().unwrap())
        .sum();
    assert_eq!(order_total, count(&store, tables::ORDERS).await);

    // Product review counters must sum to the number of reviews.
    let products = store.query(tables::PRODUCTS, Filter::All).await.unwrap();
    let review_total: u64 = products
        .iter()
        .map(|p| p["review_count"].as_u64().unwrap())
        .sum();
    assert_eq!(review_total, count(&store, tables::REVIEWS).await);
}

#[tokio::test]
async fn test_clear_all_deletes_dependents_before_dependencies() {
    let (store, mut orchestrator) = setup();
    orchestrator.apply_preset("shop").await.unwrap();

    let cleared = orchestrator.clear_all().await.unwrap();
    let pos = |module: &str| cleared.iter().position(|(m, _)| m == module).unwrap();
    assert!(pos(keys::ORDERS) < pos(keys::PRODUCTS));
    assert!(pos(keys::REVIEWS) < pos(keys::PRODUCTS));
    assert!(pos(keys::PRODUCTS) < pos(keys::PRODUCT_CATEGORIES));
    assert!(pos(keys::ORDERS) < pos(keys::CUSTOMERS));

    for (module, _) in &cleared {
        let def = shopfront::modules::registry::find(module).unwrap();
        assert_eq!(count(&store, def.table).await, 0, "{module} not empty");
    }
}

#[tokio::test]
async fn test_factory_reset_runs_to_completion_and_restores_baseline() {
    let (store, mut orchestrator) = setup();
    orchestrator.apply_preset("full-demo").await.unwrap();

    let stepper = ResetStepper::new(store.clone()).with_config(ResetConfig {
        rows_per_step: 7,
        max_iterations: 10_000,
    });
    let iterations = stepper.run_to_completion().await.unwrap();
    assert!(iterations >= stepper.total_steps());
    assert!(iterations < 10_000);

    // Domain data is gone, baseline configuration is back.
    for table in [
        tables::PRODUCTS,
        tables::ORDERS,
        tables::CUSTOMERS,
        tables::POSTS,
        tables::BANNERS,
    ] {
        assert_eq!(count(&store, table).await, 0, "{table} not empty");
    }
    assert_eq!(
        count(&store, tables::MODULES).await,
        shopfront::modules::registry::all().len() as u64
    );
    assert_eq!(count(&store, tables::PRESETS).await, 3);
    assert!(count(&store, tables::SETTINGS).await > 0);
}

#[tokio::test]
async fn test_factory_reset_tables_are_empty_before_reseed_phase() {
    let (store, mut orchestrator) = setup();
    orchestrator.apply_preset("full-demo").await.unwrap();

    let all_tables = [
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

    let stepper = ResetStepper::new(store.clone()).with_config(ResetConfig {
        rows_per_step: 10,
        max_iterations: 10_000,
    });
    let reseed_start = stepper.total_steps() - 3;

    let mut index = 0;
    let mut guard = 0;
    loop {
        guard += 1;
        assert!(guard < 10_000, "reset did not terminate");

        // An interrupted reset resumes from the last cursor the caller saw:
        // a fresh stepper continues where the old one left off.
        let stepper = ResetStepper::new(store.clone()).with_config(ResetConfig {
            rows_per_step: 10,
            max_iterations: 10_000,
        });
        let progress = stepper.step(index).await.unwrap();

        match progress.next_index {
            Some(next) => {
                if index < reseed_start && next == reseed_start {
                    // Clearing phase just finished: every table must be empty.
                    for table in all_tables {
                        assert_eq!(count(&store, table).await, 0, "{table} not empty");
                    }
                }
                index = next;
            }
            None => {
                assert!(progress.completed);
                break;
            }
        }
    }
}

#[tokio::test]
async fn test_factory_reset_safety_limit_aborts_a_stuck_loop() {
    let (store, mut orchestrator) = setup();
    orchestrator
        .seed_bulk(&[SeedConfig::new(keys::PAGES, 5)])
        .await
        .unwrap();

    // rows_per_step of zero never drains the pages table, so the driver
    // must hit its cap instead of spinning forever.
    let stepper = ResetStepper::new(store).with_config(ResetConfig {
        rows_per_step: 0,
        max_iterations: 50,
    });
    let err = stepper.run_to_completion().await.unwrap_err();
    assert!(matches!(
        err,
        ResetError::SafetyLimitExceeded { iterations: 50 }
    ));
}

#[tokio::test]
async fn test_apply_preset_enables_modules_and_seeds() {
    let (store, mut orchestrator) = setup();

    let report = orchestrator.apply_preset("blog").await.unwrap();
    assert!(!report.has_failures());
    assert_eq!(count(&store, tables::POSTS).await, 20);

    let state = orchestrator.toggles().load_state().await.unwrap();
    assert!(state.is_enabled(keys::PAGES));
    assert!(state.is_enabled(keys::POST_CATEGORIES));
    assert!(state.is_enabled(keys::POSTS));
    assert!(!state.is_enabled(keys::PRODUCTS));
}

#[tokio::test]
async fn test_unknown_preset_is_rejected() {
    let (_store, mut orchestrator) = setup();
    let err = orchestrator.apply_preset("no-such").await.unwrap_err();
    assert!(matches!(err, SeedError::UnknownPreset(_)));
}
