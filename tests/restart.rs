// ABOUTME: End-to-end restart test for relaystore over the file backend.
// ABOUTME: Mutates stores, drops them, and verifies a fresh manager restores the same state.

use std::sync::Arc;

use relaystore_core::{Metadata, Pairing, Participant, Proposal, Reason, Relay, Session};
use relaystore_store::{FileBackend, RestoreOutcome, StoreManager};
use serde_json::json;

const PREFIX: &str = "wc@2:client:";

fn open_manager(dir: &std::path::Path) -> StoreManager {
    let backend = FileBackend::open(dir).unwrap();
    StoreManager::new(Arc::new(backend), PREFIX)
}

fn proposal(id: u64) -> Proposal {
    let mut proposal = Proposal::new(
        id,
        Participant {
            public_key: "a1b2".to_string(),
            metadata: Some(Metadata {
                name: "Example Dapp".to_string(),
                description: "A dapp".to_string(),
                url: Some("https://example.org".to_string()),
                icons: Vec::new(),
            }),
        },
        Relay {
            protocol: "irn".to_string(),
            data: None,
        },
    );
    proposal.expiry = Some(1_700_000_300);
    proposal
        .extra
        .insert("requiredNamespaces".to_string(), json!({"eip155": {"chains": ["eip155:1"]}}));
    proposal
}

#[tokio::test]
async fn restart_restores_all_stores() {
    let dir = tempfile::TempDir::new().unwrap();

    // 1. First run: cold start, then populate every store.
    {
        let manager = open_manager(dir.path());
        let report = manager.init_all().await;
        assert_eq!(report.sessions, RestoreOutcome::ColdStart);

        manager.proposals.set(1, proposal(1)).await.unwrap();
        manager.proposals.set(2, proposal(2)).await.unwrap();
        manager
            .proposals
            .delete(&1, &Reason::new(5100, "proposal approved"))
            .await
            .unwrap();

        manager.pairings.set("p1".to_string(), Pairing::new("p1", 500)).await.unwrap();
        manager
            .pairings
            .update(&"p1".to_string(), json!({"active": true}))
            .await
            .unwrap();

        manager.sessions.set("t1".to_string(), Session::new("t1", 100)).await.unwrap();
        manager
            .sessions
            .update(&"t1".to_string(), json!({"acknowledged": true, "controller": "c1"}))
            .await
            .unwrap();
    }

    // 2. Second run: everything comes back from disk.
    let manager = open_manager(dir.path());
    let report = manager.init_all().await;
    assert!(matches!(report.proposals, RestoreOutcome::Restored { loaded: 1, .. }));
    assert!(matches!(report.pairings, RestoreOutcome::Restored { loaded: 1, .. }));
    assert!(matches!(report.sessions, RestoreOutcome::Restored { loaded: 1, .. }));

    assert_eq!(manager.proposals.keys().await, vec![2]);
    assert_eq!(manager.proposals.get(&2).await.unwrap(), proposal(2));

    let pairing = manager.pairings.get(&"p1".to_string()).await.unwrap();
    assert!(pairing.active);
    assert_eq!(pairing.expiry, 500);

    let session = manager.sessions.get(&"t1".to_string()).await.unwrap();
    assert_eq!(session.acknowledged, Some(true));
    assert_eq!(session.controller.as_deref(), Some("c1"));
    assert_eq!(session.expiry, 100);
}

#[tokio::test]
async fn corrupt_snapshot_degrades_to_cold_start() {
    let dir = tempfile::TempDir::new().unwrap();
    let backend = FileBackend::open(dir.path()).unwrap();
    let session_key = format!("{}0.3//session", PREFIX);
    std::fs::write(backend.path_for(&session_key), r#"[{"topic":"t1""#).unwrap();

    let manager = StoreManager::new(Arc::new(backend), PREFIX);
    let report = manager.init_all().await;

    assert!(matches!(report.sessions, RestoreOutcome::Failed(_)));
    assert_eq!(report.pairings, RestoreOutcome::ColdStart);
    assert!(manager.sessions.is_empty().await);

    // Writing after a failed restore replaces the corrupt snapshot.
    manager.sessions.set("t2".to_string(), Session::new("t2", 7)).await.unwrap();
    let restarted = open_manager(dir.path());
    restarted.init_all().await;
    assert_eq!(restarted.sessions.keys().await, vec!["t2".to_string()]);
}

#[tokio::test]
async fn snapshot_with_foreign_records_keeps_only_session_shaped_values() {
    let dir = tempfile::TempDir::new().unwrap();
    let backend = FileBackend::open(dir.path()).unwrap();
    let session_key = format!("{}0.3//session", PREFIX);
    let snapshot = json!([
        {"topic": "t1", "expiry": 100},
        {"unexpected": "shape"},
        {"id": 3, "proposer": {"publicKey": "pk"}, "relay": {"protocol": "irn"}}
    ]);
    std::fs::write(
        backend.path_for(&session_key),
        serde_json::to_vec(&snapshot).unwrap(),
    )
    .unwrap();

    let manager = StoreManager::new(Arc::new(backend), PREFIX);
    let report = manager.init_all().await;

    assert_eq!(
        report.sessions,
        RestoreOutcome::Restored {
            loaded: 1,
            skipped: 2
        }
    );
    assert_eq!(manager.sessions.keys().await, vec!["t1".to_string()]);
}
