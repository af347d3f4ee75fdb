//! Integration tests for the module toggle engine: enable ordering,
//! cascade confirmation, and cascade execution against an in-memory store.

use std::sync::Arc;

use shopfront::modules::keys;
use shopfront::modules::toggle::{ToggleEngine, ToggleError};
use shopfront::store::MemoryStore;

fn engine() -> ToggleEngine {
    ToggleEngine::new(Arc::new(MemoryStore::new())).unwrap()
}

#[tokio::test]
async fn test_defaults_enable_only_core_modules() {
    let engine = engine();
    let state = engine.load_state().await.unwrap();

    assert!(state.is_enabled(keys::SETTINGS));
    assert!(!state.is_enabled(keys::PRODUCTS));
    assert!(!state.is_enabled(keys::POSTS));
}

#[tokio::test]
async fn test_enable_requires_satisfied_dependencies() {
    let engine = engine();

    let err = engine.enable(keys::PRODUCTS).await.unwrap_err();
    match err {
        ToggleError::UnsatisfiedDependency { module, missing } => {
            assert_eq!(module, keys::PRODUCTS);
            assert_eq!(missing, keys::PRODUCT_CATEGORIES);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    engine.enable(keys::PRODUCT_CATEGORIES).await.unwrap();
    engine.enable(keys::PRODUCTS).await.unwrap();
    assert!(engine.load_state().await.unwrap().is_enabled(keys::PRODUCTS));
}

#[tokio::test]
async fn test_enable_many_orders_dependencies_first() {
    let engine = engine();

    let order = engine
        .enable_many(&[keys::ORDERS, keys::CUSTOMERS])
        .await
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

    let state = engine.load_state().await.unwrap();
    for key in order {
        assert!(state.is_enabled(&key), "{key} should be enabled");
    }
}

#[tokio::test]
async fn test_enable_any_mode_with_one_branch() {
    let engine = engine();

    // banners accepts either posts or products; enabling the commerce
    // branch alone must satisfy it. Request banners explicitly after its
    // dependency so no pending content-side dependency gets pulled in.
    engine
        .enable_many(&[keys::PRODUCT_CATEGORIES, keys::PRODUCTS])
        .await
        .unwrap();
    engine.enable(keys::BANNERS).await.unwrap();

    let state = engine.load_state().await.unwrap();
    assert!(state.is_enabled(keys::BANNERS));
    assert!(!state.is_enabled(keys::POSTS));
}

#[tokio::test]
async fn test_core_module_cannot_be_disabled() {
    let engine = engine();
    let err = engine.disable(keys::SETTINGS).await.unwrap_err();
    assert!(matches!(err, ToggleError::CoreModuleLocked(_)));
}

#[tokio::test]
async fn test_unacknowledged_cascade_leaves_state_unchanged() {
    let engine = engine();
    engine
        .enable_many(&[keys::PRODUCTS, keys::ORDERS, keys::PROMOTIONS])
        .await
        .unwrap();
    let before = engine.load_state().await.unwrap();

    let err = engine.disable(keys::PRODUCTS).await.unwrap_err();
    match err {
        ToggleError::CascadeConfirmationRequired(targets) => {
            assert_eq!(targets, vec![keys::ORDERS, keys::PROMOTIONS]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let after = engine.load_state().await.unwrap();
    for def in shopfront::modules::registry::all() {
        assert_eq!(
            before.is_enabled(def.key),
            after.is_enabled(def.key),
            "state of {} changed without acknowledgement",
            def.key
        );
    }
}

#[tokio::test]
async fn test_incomplete_acknowledgement_is_rejected() {
    let engine = engine();
    engine
        .enable_many(&[keys::ORDERS, keys::PROMOTIONS])
        .await
        .unwrap();

    let err = engine
        .disable_with_cascade(keys::PRODUCTS, &[keys::ORDERS.to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ToggleError::CascadeConfirmationRequired(_)));
    assert!(engine.load_state().await.unwrap().is_enabled(keys::PROMOTIONS));
}

#[tokio::test]
async fn test_acknowledged_cascade_disables_transitive_dependents() {
    let engine = engine();
    engine
        .enable_many(&[keys::ORDERS, keys::REVIEWS, keys::PROMOTIONS, keys::PAGES])
        .await
        .unwrap();

    // Disabling product_categories strands products, which strands its own
    // dependents; the acknowledgement must cover the whole transitive set.
    let expected = vec![
        keys::PRODUCTS.to_string(),
        keys::ORDERS.to_string(),
        keys::REVIEWS.to_string(),
        keys::PROMOTIONS.to_string(),
    ];
    let cascade = engine
        .disable_with_cascade(keys::PRODUCT_CATEGORIES, &expected)
        .await
        .unwrap();
    assert_eq!(cascade, expected);

    let state = engine.load_state().await.unwrap();
    assert!(!state.is_enabled(keys::PRODUCT_CATEGORIES));
    for key in &expected {
        assert!(!state.is_enabled(key), "{key} should be disabled");
    }
    // Unrelated modules keep their state.
    assert!(state.is_enabled(keys::PAGES));
    assert!(state.is_enabled(keys::SETTINGS));
}

#[tokio::test]
async fn test_disable_leaf_module_needs_no_confirmation() {
    let engine = engine();
    engine.enable_many(&[keys::ORDERS]).await.unwrap();

    engine.disable(keys::ORDERS).await.unwrap();
    let state = engine.load_state().await.unwrap();
    assert!(!state.is_enabled(keys::ORDERS));
    assert!(state.is_enabled(keys::PRODUCTS));
}
