//! Transaction-log pagination through the engine: page walks must
//! reconstruct a participant's history exactly, stay correct under
//! concurrent appends, and respect the configured size limits.

use keytier_core::Role;
use keytier_ledger::{Actor, LedgerConfig, LedgerEngine};
use keytier_store::{MemoryDeviceStore, MemoryLedgerStore};

type Engine = LedgerEngine<MemoryLedgerStore, MemoryLedgerStore, MemoryDeviceStore>;

fn setup() -> (Engine, Actor) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .try_init();

    let store = MemoryLedgerStore::new();
    let admin = store.register_user(Role::SuperAdmin, "root", None).unwrap();
    let engine = LedgerEngine::new(store.clone(), store, MemoryDeviceStore::new());
    (
        engine,
        Actor {
            id: admin.id,
            role: Role::SuperAdmin,
        },
    )
}

/// Each creation appends exactly one record for the creator.
async fn seed_records(engine: &Engine, admin: Actor, n: usize) {
    for _ in 0..n {
        engine.create_keys(admin, 1, 0).await.unwrap();
    }
}

#[tokio::test]
async fn page_walk_reconstructs_full_history() {
    let (engine, admin) = setup();
    seed_records(&engine, admin, 23).await;

    let mut collected = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let page = engine
            .list_transactions(admin.id, cursor, Some(5))
            .await
            .unwrap();
        assert!(page.records.len() <= 5);
        collected.extend(page.records);
        pages += 1;
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor;
    }

    assert_eq!(pages, 5);
    assert_eq!(collected.len(), 23);

    // Strictly descending, no duplicates, no gaps.
    for pair in collected.windows(2) {
        assert!(pair[0].timestamp > pair[1].timestamp);
    }
    let unique: std::collections::HashSet<_> = collected.iter().map(|r| r.id).collect();
    assert_eq!(unique.len(), 23);
}

#[tokio::test]
async fn default_page_size_is_ten() {
    let (engine, admin) = setup();
    seed_records(&engine, admin, 12).await;

    let page = engine.list_transactions(admin.id, None, None).await.unwrap();
    assert_eq!(page.records.len(), 10);
    assert!(page.has_more);
}

#[tokio::test]
async fn last_page_reports_no_more() {
    let (engine, admin) = setup();
    seed_records(&engine, admin, 4).await;

    let page = engine.list_transactions(admin.id, None, Some(10)).await.unwrap();
    assert_eq!(page.records.len(), 4);
    assert!(!page.has_more);

    // Following the cursor anyway yields an empty page.
    let beyond = engine
        .list_transactions(admin.id, page.next_cursor, Some(10))
        .await
        .unwrap();
    assert!(beyond.records.is_empty());
    assert!(!beyond.has_more);
    assert!(beyond.next_cursor.is_none());
}

#[tokio::test]
async fn cursor_is_stable_under_concurrent_appends() {
    let (engine, admin) = setup();
    seed_records(&engine, admin, 8).await;

    let first = engine.list_transactions(admin.id, None, Some(4)).await.unwrap();
    let first_ids: Vec<_> = first.records.iter().map(|r| r.id).collect();

    // New records land after the cursor was issued.
    seed_records(&engine, admin, 3).await;

    // The older page is unaffected: nothing new, nothing repeated.
    let second = engine
        .list_transactions(admin.id, first.next_cursor, Some(10))
        .await
        .unwrap();
    assert_eq!(second.records.len(), 4);
    for r in &second.records {
        assert!(!first_ids.contains(&r.id));
        assert!(r.timestamp < first.records.last().unwrap().timestamp);
    }

    // A fresh first page sees the new records on top.
    let fresh = engine.list_transactions(admin.id, None, Some(20)).await.unwrap();
    assert_eq!(fresh.records.len(), 11);
}

#[tokio::test]
async fn page_size_is_clamped_to_configured_cap() {
    let store = MemoryLedgerStore::new();
    let admin = store.register_user(Role::SuperAdmin, "root", None).unwrap();
    let config = LedgerConfig {
        max_keys_per_create: 100,
        default_page_size: 2,
        max_page_size: 3,
    };
    let engine: Engine =
        LedgerEngine::with_config(store.clone(), store, MemoryDeviceStore::new(), config);
    let actor = Actor {
        id: admin.id,
        role: Role::SuperAdmin,
    };
    seed_records(&engine, actor, 6).await;

    let defaulted = engine.list_transactions(actor.id, None, None).await.unwrap();
    assert_eq!(defaulted.records.len(), 2);

    let oversized = engine
        .list_transactions(actor.id, None, Some(50))
        .await
        .unwrap();
    assert_eq!(oversized.records.len(), 3);
}

#[tokio::test]
async fn uninvolved_participant_sees_nothing() {
    let (engine, admin) = setup();
    seed_records(&engine, admin, 3).await;

    let outsider = keytier_core::UserId::new();
    let page = engine.list_transactions(outsider, None, None).await.unwrap();
    assert!(page.records.is_empty());
    assert!(!page.has_more);
}
