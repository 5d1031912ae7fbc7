//! Contract Test: Cycle Shape
//!
//! This test verifies the shape of the store traffic one cycle produces.
//!
//! Constraints verified:
//! - Exactly one store action per address family per cycle
//! - Upserts carry the full sorted, deduplicated address set and the TTL
//! - Zone and record names reach the store fully qualified
//! - An empty family yields a delete, and delete-on-absent is a no-op

mod common;

use common::*;
use nodedns_core::SyncEngine;
use nodedns_core::reconcile::FamilyOutcome;

#[tokio::test]
async fn one_action_per_family_with_mixed_addresses() {
    let source = MockNodeSource::new(vec![node(
        "node-a",
        Some("152.67.73.95,2603:c022:5:1e00:a452:9f75:7f83:3a88"),
    )]);
    let store = MockRecordStore::new();
    let store_handle = MockRecordStore::sharing_state_with(&store);

    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), test_config())
            .expect("engine construction succeeds");

    let outcome = engine.run_once().await.expect("cycle succeeds");
    assert_eq!(outcome.v4, FamilyOutcome::Upserted(1));
    assert_eq!(outcome.v6, FamilyOutcome::Upserted(1));

    let upserts = store_handle.upserts();
    assert_eq!(upserts.len(), 2, "one upsert per family");
    assert!(store_handle.deletes().is_empty(), "no deletes when both families have addresses");

    let a = upserts.iter().find(|u| u.record_type == "A").unwrap();
    assert_eq!(a.addresses, vec!["152.67.73.95"]);

    let aaaa = upserts.iter().find(|u| u.record_type == "AAAA").unwrap();
    assert_eq!(
        aaaa.addresses,
        vec!["2603:c022:5:1e00:a452:9f75:7f83:3a88"]
    );
}

#[tokio::test]
async fn upsert_carries_sorted_set_and_ttl() {
    let source = MockNodeSource::new(vec![node("node-a", Some("192.168.1.1, 10.0.0.1"))]);
    let store = MockRecordStore::new();
    let store_handle = MockRecordStore::sharing_state_with(&store);

    let config = test_config().with_ttl_secs(120);
    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), config)
            .expect("engine construction succeeds");

    engine.run_once().await.expect("cycle succeeds");

    let upserts = store_handle.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].record_type, "A");
    assert_eq!(upserts[0].ttl, 120);
    assert_eq!(upserts[0].addresses, vec!["10.0.0.1", "192.168.1.1"]);

    // The empty IPv6 family gets a delete.
    let deletes = store_handle.deletes();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].record_type, "AAAA");
}

#[tokio::test]
async fn names_reach_the_store_fully_qualified() {
    let source = MockNodeSource::new(vec![node("node-a", Some("10.0.0.1"))]);
    let store = MockRecordStore::new();
    let store_handle = MockRecordStore::sharing_state_with(&store);

    // Config names carry no trailing dot.
    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), test_config())
            .expect("engine construction succeeds");

    engine.run_once().await.expect("cycle succeeds");

    for upsert in store_handle.upserts() {
        assert_eq!(upsert.zone, "example.com.");
        assert_eq!(upsert.record, "cluster.example.com.");
    }
    for delete in store_handle.deletes() {
        assert_eq!(delete.zone, "example.com.");
        assert_eq!(delete.record, "cluster.example.com.");
    }
}

#[tokio::test]
async fn no_addresses_deletes_both_families() {
    let source = MockNodeSource::new(vec![node("node-a", None), node("node-b", Some(""))]);
    let store = MockRecordStore::new();
    let store_handle = MockRecordStore::sharing_state_with(&store);

    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), test_config())
            .expect("engine construction succeeds");

    let outcome = engine.run_once().await.expect("cycle succeeds");
    assert_eq!(outcome.v4, FamilyOutcome::Deleted);
    assert_eq!(outcome.v6, FamilyOutcome::Deleted);

    assert!(store_handle.upserts().is_empty());
    let types: Vec<String> = store_handle
        .deletes()
        .into_iter()
        .map(|d| d.record_type)
        .collect();
    assert_eq!(types, vec!["A", "AAAA"]);
}

#[tokio::test]
async fn delete_on_absent_record_is_a_no_op() {
    let source = MockNodeSource::new(vec![]);
    let store = MockRecordStore::new().with_absent_records();

    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), test_config())
            .expect("engine construction succeeds");

    let outcome = engine.run_once().await.expect("absent records are not an error");
    assert_eq!(outcome.v4, FamilyOutcome::AlreadyAbsent);
    assert_eq!(outcome.v6, FamilyOutcome::AlreadyAbsent);
}

#[tokio::test]
async fn malformed_annotation_does_not_abort_the_cycle() {
    let source = MockNodeSource::new(vec![
        node("node-a", Some("invalid-ip")),
        node("node-b", Some("10.0.0.1")),
    ]);
    let store = MockRecordStore::new();
    let store_handle = MockRecordStore::sharing_state_with(&store);

    let (engine, _event_rx) =
        SyncEngine::new(Box::new(source), Box::new(store), test_config())
            .expect("engine construction succeeds");

    engine.run_once().await.expect("cycle succeeds");

    let upserts = store_handle.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].addresses, vec!["10.0.0.1"]);
}
