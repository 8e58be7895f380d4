//! # Brutal Security Tests for the Provenance Registry
//!
//! These tests attempt to break the registry's guarantees.
//!
//! ## Test Categories
//!
//! 1. **Privilege Attacks** - Self-promotion, role spoofing, stale admins
//! 2. **State Corruption** - Rejected calls leaving traces
//! 3. **Concurrency** - Racing writers, readers during writes
//! 4. **Event Ordering** - Events before commit, gaps, reordering

use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, RegistryEvent};
use shared_types::{Identity, Role, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tc_batch_registry::{
    CommandHandler, ErrorKind, ManualTimeSource, NewBatch, NewCheckpoint, ProvenanceRegistryApi,
    RegistryCommand, RegistryConfig, RegistryService,
};
use tokio::time::timeout;
use tokio_stream::StreamExt;

// =============================================================================
// TEST HELPERS
// =============================================================================

const ADMIN: Identity = Identity::from_bytes([0xAD; 20]);

fn identity(n: u8) -> Identity {
    Identity::from_bytes([n; 20])
}

fn make_registry() -> (Arc<RegistryService>, Arc<InMemoryEventBus>) {
    let bus = Arc::new(InMemoryEventBus::with_capacity(4096));
    let registry = RegistryService::new(
        RegistryConfig::new(ADMIN),
        bus.clone(),
        Arc::new(ManualTimeSource::new(1_000)),
    )
    .unwrap();
    (Arc::new(registry), bus)
}

/// Snapshot of everything observable, for before/after comparisons.
async fn observe(registry: &RegistryService, who: &[Identity]) -> (u64, Vec<Role>, Vec<u64>) {
    let view = registry.query().await;
    let roles = who.iter().map(|id| view.role_of(id)).collect();
    let counts = (1..=view.batch_count())
        .map(|id| view.checkpoint_count(id).unwrap())
        .collect();
    (view.batch_count(), roles, counts)
}

// =============================================================================
// PRIVILEGE ATTACKS
// =============================================================================

/// ATTACK: Producer tries to promote itself to Admin
#[tokio::test]
async fn brutal_self_promotion() {
    let (registry, _) = make_registry();
    let mallory = identity(0x66);
    registry.assign_role(&ADMIN, mallory, Role::Producer).await.unwrap();

    for role in Role::ALL {
        let err = registry.assign_role(&mallory, mallory, role).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized, "self-assign {role} must fail");
    }
    assert_eq!(registry.role_of(&mallory).await, Role::Producer);
}

/// ATTACK: Buyer claims to be a Transporter when logging custody
#[tokio::test]
async fn brutal_checkpoint_role_spoofing() {
    let (registry, _) = make_registry();
    let handler = CommandHandler::new(registry.clone());
    let producer = identity(1);
    let buyer = identity(2);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry.assign_role(&ADMIN, buyer, Role::Buyer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("COOP-1", "Coffee", 1, ""))
        .await
        .unwrap();

    let tx = Transaction::new(
        buyer,
        RegistryCommand::AddCheckpoint {
            batch_id: 1,
            role: Some("TRANSPORTER".into()),
            status: "in transit".into(),
            evidence_ref: String::new(),
            note: String::new(),
        },
    );
    let receipt = handler.handle(tx).await;
    assert!(receipt.is_committed());

    let cp = registry.get_checkpoint(1, 0).await.unwrap();
    assert_eq!(cp.role, Role::Buyer, "recorded role must come from the assignment");
    assert_eq!(registry.stats().await.role_label_mismatches, 1);
}

/// ATTACK: Demoted admin keeps issuing assignments
#[tokio::test]
async fn brutal_demoted_admin_loses_power() {
    let (registry, _) = make_registry();
    let deputy = identity(3);
    registry.assign_role(&ADMIN, deputy, Role::Admin).await.unwrap();
    registry.assign_role(&deputy, ADMIN, Role::None).await.unwrap();

    let err = registry
        .assign_role(&ADMIN, ADMIN, Role::Admin)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(registry.role_of(&ADMIN).await, Role::None);
    assert_eq!(registry.role_of(&deputy).await, Role::Admin);
}

/// ATTACK: Admin tries to create a batch without holding Producer
#[tokio::test]
async fn brutal_admin_is_not_producer() {
    let (registry, _) = make_registry();
    let err = registry
        .create_batch(&ADMIN, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

/// ATTACK: Revoked transporter keeps appending
#[tokio::test]
async fn brutal_revoked_role_cannot_append() {
    let (registry, _) = make_registry();
    let producer = identity(1);
    let transporter = identity(4);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry.assign_role(&ADMIN, transporter, Role::Transporter).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();
    registry.assign_role(&ADMIN, transporter, Role::None).await.unwrap();

    let err = registry
        .add_checkpoint(&transporter, NewCheckpoint::new(1, "moved", "", ""))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(registry.checkpoint_count(1).await.unwrap(), 0);
}

// =============================================================================
// STATE CORRUPTION
// =============================================================================

/// ATTACK: Flood of rejected calls of every kind
#[tokio::test]
async fn brutal_rejections_leave_no_trace() {
    let (registry, bus) = make_registry();
    let producer = identity(1);
    let stranger = identity(9);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();

    let who = [ADMIN, producer, stranger];
    let before = observe(&registry, &who).await;
    let sequence_before = registry.query().await.sequence();
    let mut sub = bus.subscribe(EventFilter::all());

    let oversized = "x".repeat(10_000);
    let attempts = vec![
        registry.assign_role(&stranger, stranger, Role::Admin).await.map(|_| ()),
        registry
            .create_batch(&stranger, NewBatch::new("C", "P", 1, ""))
            .await
            .map(|_| ()),
        registry
            .create_batch(&producer, NewBatch::new("", "P", 1, ""))
            .await
            .map(|_| ()),
        registry
            .create_batch(&producer, NewBatch::new("C", "P", 1, oversized.clone()))
            .await
            .map(|_| ()),
        registry
            .add_checkpoint(&stranger, NewCheckpoint::new(1, "x", "", ""))
            .await
            .map(|_| ()),
        registry
            .add_checkpoint(&producer, NewCheckpoint::new(2, "x", "", ""))
            .await
            .map(|_| ()),
        registry
            .add_checkpoint(&producer, NewCheckpoint::new(1, "   ", "", ""))
            .await
            .map(|_| ()),
        registry
            .add_checkpoint(&producer, NewCheckpoint::new(1, "x", "", oversized))
            .await
            .map(|_| ()),
    ];
    assert!(attempts.iter().all(Result::is_err));

    assert_eq!(observe(&registry, &who).await, before);
    assert_eq!(registry.query().await.sequence(), sequence_before);
    assert_eq!(sub.try_recv(), Ok(None), "rejected calls must not emit events");
    assert_eq!(registry.stats().await.rejected(), 8);
}

/// ATTACK: Out-of-range checkpoint indices
#[tokio::test]
async fn brutal_checkpoint_index_bounds() {
    let (registry, _) = make_registry();
    let producer = identity(1);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();
    registry
        .add_checkpoint(&producer, NewCheckpoint::new(1, "ok", "", ""))
        .await
        .unwrap();

    for index in [1, 2, u64::MAX / 2, u64::MAX] {
        let err = registry.get_checkpoint(1, index).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "index {index}");
    }
    for batch_id in [0, 2, u64::MAX] {
        let err = registry.get_checkpoint(batch_id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "batch {batch_id}");
    }
}

// =============================================================================
// CONCURRENCY
// =============================================================================

/// ATTACK: Many producers race to create batches
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn brutal_concurrent_creation_yields_dense_ids() {
    let (registry, bus) = make_registry();
    let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Batches]));

    let producers: Vec<_> = (1..=8).map(identity).collect();
    for p in &producers {
        registry.assign_role(&ADMIN, *p, Role::Producer).await.unwrap();
    }

    let mut tasks = Vec::new();
    for p in producers.clone() {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for n in 0..25u64 {
                let id = registry
                    .create_batch(&p, NewBatch::new("COOP", "Beans", n + 1, ""))
                    .await
                    .unwrap();
                ids.push(id);
            }
            ids
        }));
    }

    let mut all = Vec::new();
    for task in tasks {
        let ids = task.await.unwrap();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "per-task ids must increase");
        all.extend(ids);
    }
    all.sort_unstable();
    let expected: Vec<u64> = (1..=200).collect();
    assert_eq!(all, expected);

    // Events arrive in commit order and batch ids follow it.
    let mut last_sequence = 0;
    for expected_id in 1..=200u64 {
        match sub.recv().await {
            Some(RegistryEvent::BatchCreated { sequence, batch }) => {
                assert!(sequence > last_sequence);
                assert_eq!(batch.id, expected_id);
                last_sequence = sequence;
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

/// ATTACK: Concurrent appends to the same batch
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn brutal_concurrent_appends_keep_every_checkpoint() {
    let (registry, _) = make_registry();
    let producer = identity(1);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();

    let actors: Vec<_> = (10..16).map(identity).collect();
    for a in &actors {
        registry.assign_role(&ADMIN, *a, Role::Inspector).await.unwrap();
    }

    let mut tasks = Vec::new();
    for a in actors {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..20 {
                registry
                    .add_checkpoint(&a, NewCheckpoint::new(1, format!("{a}-{n}"), "", ""))
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let view = registry.query().await;
    assert_eq!(view.checkpoint_count(1).unwrap(), 120);
    let statuses: HashSet<_> = view.checkpoints(1).unwrap().map(|c| c.status).collect();
    assert_eq!(statuses.len(), 120, "no checkpoint lost or overwritten");
}

/// ATTACK: Reader holds a snapshot while writers keep going
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn brutal_snapshot_is_not_torn() {
    let (registry, _) = make_registry();
    let producer = identity(1);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();

    let writer = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for n in 0..200 {
                registry
                    .add_checkpoint(&producer, NewCheckpoint::new(1, format!("s{n}"), "", ""))
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let view = registry.query().await;
        let count = view.checkpoint_count(1).unwrap();
        let walked = view.checkpoints(1).unwrap().count() as u64;
        assert_eq!(walked, count);
        // Sequence = 1 role + 1 batch + one per checkpoint.
        assert_eq!(view.sequence(), 2 + count);
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
}

// =============================================================================
// EVENT ORDERING
// =============================================================================

/// ATTACK: Subscriber races to read state the moment an event arrives
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn brutal_event_never_precedes_commit() {
    let (registry, bus) = make_registry();
    let mut stream = bus.event_stream(EventFilter::topics(vec![EventTopic::Checkpoints]));
    let producer = identity(1);
    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();

    let reader = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let event = timeout(Duration::from_secs(5), stream.next())
                    .await
                    .expect("event stream stalled")
                    .unwrap();
                if let RegistryEvent::CheckpointAdded {
                    index, checkpoint, ..
                } = event
                {
                    let stored = registry.get_checkpoint(1, index).await.unwrap();
                    assert_eq!(stored, checkpoint);
                }
            }
        })
    };

    for n in 0..50 {
        registry
            .add_checkpoint(&producer, NewCheckpoint::new(1, format!("s{n}"), "", ""))
            .await
            .unwrap();
    }
    reader.await.unwrap();
}

/// ATTACK: Look for gaps or duplicates in the commit sequence
#[tokio::test]
async fn brutal_sequences_are_gapless() {
    let (registry, bus) = make_registry();
    let mut sub = bus.subscribe(EventFilter::all());
    let producer = identity(1);

    registry.assign_role(&ADMIN, producer, Role::Producer).await.unwrap();
    let _ = registry.assign_role(&producer, producer, Role::Admin).await;
    registry
        .create_batch(&producer, NewBatch::new("C", "P", 1, ""))
        .await
        .unwrap();
    let _ = registry
        .add_checkpoint(&producer, NewCheckpoint::new(7, "x", "", ""))
        .await;
    registry
        .add_checkpoint(&producer, NewCheckpoint::new(1, "x", "", ""))
        .await
        .unwrap();

    let mut sequences = Vec::new();
    while let Ok(Some(event)) = sub.try_recv() {
        sequences.push(event.sequence());
    }
    assert_eq!(sequences, vec![1, 2, 3]);
}
