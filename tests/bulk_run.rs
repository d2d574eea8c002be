mod common;

use common::MockStore;
use graphstate::{
    run_bulk, run_single, AdapterFailure, Compiler, EntityDescriptor, MutationError, RunOptions,
};
use serde_json::json;

fn vertex(name: &str) -> EntityDescriptor {
    serde_json::from_value(json!({
        "entity": "vertex",
        "label": "Person",
        "entity_name": name,
        "properties": {
            "age": { "value": "30", "type": "int" }
        }
    }))
    .unwrap()
}

fn fleet(count: usize) -> Vec<EntityDescriptor> {
    (0..count).map(|i| vertex(&format!("person {i}"))).collect()
}

#[test]
fn bulk_matches_single_item_aggregates() {
    let compiler = Compiler::new();
    let descriptors = fleet(250);
    let options = RunOptions::default().with_batch_size(100);

    let mut bulk_store = MockStore::new();
    let summary = run_bulk(&compiler, &mut bulk_store, &descriptors, &options).unwrap();
    assert_eq!(bulk_store.calls.len(), 3, "250 items at batch 100 is 3 round trips");
    assert_eq!(summary.total, 250);
    assert_eq!(summary.processed, 250);
    assert_eq!(summary.counters.nodes_created, 250);
    assert!(summary.changed);

    let mut single_store = MockStore::new();
    let mut created = 0;
    for descriptor in &descriptors {
        let payload = run_single(&compiler, &mut single_store, descriptor, &options).unwrap();
        created += payload.counters.nodes_created;
    }
    assert_eq!(created, summary.counters.nodes_created);
}

#[test]
fn batch_sizes_follow_declaration_order() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let options = RunOptions::default().with_batch_size(100);
    run_bulk(&compiler, &mut store, &fleet(250), &options).unwrap();
    let sizes: Vec<usize> = store
        .calls
        .iter()
        .map(|(_, bindings)| bindings["batch"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    let first = &store.calls[0].1["batch"][0];
    assert_eq!(first["entity_name"], json!("person 0"));
}

#[test]
fn singleton_rerun_is_a_creation_noop() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let descriptors = fleet(5);
    let options = RunOptions::default();

    let first = run_bulk(&compiler, &mut store, &descriptors, &options).unwrap();
    assert_eq!(first.counters.nodes_created, 5);
    assert!(first.changed);

    let second = run_bulk(&compiler, &mut store, &descriptors, &options).unwrap();
    assert_eq!(second.counters.nodes_created, 0);
    assert!(second.counters.properties_set > 0, "property bag is reapplied");
    assert!(!second.changed);
}

#[test]
fn store_failure_aborts_the_remaining_queue() {
    let compiler = Compiler::new();
    let failure = AdapterFailure::Store {
        code: Some("Neo.ClientError.Schema.ConstraintValidationFailed".into()),
        message: "already exists".into(),
    };
    let mut store = MockStore::failing_at(1, failure);
    let options = RunOptions::default().with_batch_size(100);

    let err = run_bulk(&compiler, &mut store, &fleet(250), &options).unwrap_err();
    assert!(matches!(err.error, MutationError::Store { .. }));
    assert_eq!(err.offset, Some(100), "second batch starts at item 100");
    assert!(err.statement.as_deref().unwrap().starts_with("UNWIND $batch AS row"));
    assert!(err.bindings.is_some());

    let partial = err.summary.unwrap();
    assert_eq!(partial.processed, 100, "first batch stays committed");
    assert_eq!(partial.errors, 1);
    assert_eq!(store.calls.len(), 2, "third batch is never attempted");
}

#[test]
fn unexpected_failure_is_an_abend() {
    let compiler = Compiler::new();
    let mut store = MockStore::failing_at(0, AdapterFailure::Unexpected("socket reset".into()));
    let err = run_bulk(&compiler, &mut store, &fleet(3), &RunOptions::default()).unwrap_err();
    assert!(matches!(err.error, MutationError::Abend(_)));
    assert_eq!(store.calls.len(), 1);
}

#[test]
fn validation_failure_never_reaches_the_store() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let mut descriptors = fleet(3);
    descriptors.insert(
        1,
        serde_json::from_value(json!({
            "entity": "vertex",
            "label": "bad label",
            "entity_name": "x"
        }))
        .unwrap(),
    );

    let err = run_bulk(&compiler, &mut store, &descriptors, &RunOptions::default()).unwrap_err();
    assert!(matches!(err.error, MutationError::Validation { .. }));
    assert_eq!(err.offset, Some(1));
    assert!(store.calls.is_empty(), "no partial mutation on validation failure");
    assert_eq!(err.summary.unwrap().processed, 0);
}

#[test]
fn bad_unique_key_fails_fast_in_bulk() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let edge: EntityDescriptor = serde_json::from_value(json!({
        "entity": "edge",
        "type": "OWES",
        "from": { "label": "Person", "entity_name": "Ada" },
        "to": { "label": "Person", "entity_name": "Grace" },
        "properties": { "amount": { "value": 5, "type": "int" } },
        "unique_key": "since"
    }))
    .unwrap();

    let err = run_bulk(&compiler, &mut store, &[edge], &RunOptions::default()).unwrap_err();
    assert_eq!(err.error.to_string(), "unique_key 'since' not found in properties");
    assert!(store.calls.is_empty());
}

#[test]
fn check_mode_probes_once_without_mutating() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let options = RunOptions::default().with_check_mode(true);

    let summary = run_bulk(&compiler, &mut store, &fleet(10), &options).unwrap();
    assert_eq!(store.calls.len(), 1);
    assert!(store.calls[0].0.starts_with("CALL dbms.components()"));
    assert!(store.vertices.is_empty());
    assert_eq!(summary.processed, 10, "all items validated");
    assert!(!summary.changed);
}

#[test]
fn single_run_payload_carries_reproduction_material() {
    let compiler = Compiler::new();
    let mut store = MockStore::new();
    let payload =
        run_single(&compiler, &mut store, &vertex("Ada"), &RunOptions::default()).unwrap();
    assert!(payload.statement.contains("$entity_name"));
    assert!(payload.debug_statement.contains("'Ada'"));
    assert!(!payload.debug_statement.contains('$'));
    assert_eq!(payload.counters.nodes_created, 1);
    assert!(payload.changed);
}

#[test]
fn single_run_store_failure_reports_the_debug_statement() {
    let compiler = Compiler::new();
    let failure = AdapterFailure::Store {
        code: None,
        message: "boom".into(),
    };
    let mut store = MockStore::failing_at(0, failure);
    let err =
        run_single(&compiler, &mut store, &vertex("Ada"), &RunOptions::default()).unwrap_err();
    assert!(err.statement.as_deref().unwrap().contains("'Ada'"));
    assert!(err.bindings.is_some());
    assert!(err.offset.is_none());
}
