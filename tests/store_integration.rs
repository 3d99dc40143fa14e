//! Integration tests for the optimistic store and its offline queue.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use taskstream::queue::{QueueFile, QueuePersistence};
use taskstream::testing::{MockRemoteStore, RemoteCall, RemoteOp};
use taskstream::{
    NewTaskInput, OptimisticTaskStore, RemoteError, StoreConfig, TaskEventKind, TaskId, TaskPatch,
};
use tempfile::TempDir;

fn open(remote: &Arc<MockRemoteStore>, config: &StoreConfig) -> Arc<OptimisticTaskStore> {
    Arc::new(OptimisticTaskStore::open("user-1", remote.clone(), config).unwrap())
}

// ============================================================
// Queue ordering
// ============================================================

#[tokio::test]
async fn test_slow_create_is_acknowledged_before_update() {
    let remote = Arc::new(
        MockRemoteStore::new().with_latency(RemoteOp::Create, Duration::from_millis(50)),
    );
    let store = open(&remote, &StoreConfig::default());
    store.set_online(false);

    let created = store
        .create_tasks(vec![NewTaskInput::titled("A")])
        .await
        .unwrap();
    store
        .update_task(&created[0].id, TaskPatch::title("A, renamed"))
        .await
        .unwrap();

    store.set_online(true);
    let report = store.drain().await;
    assert_eq!(report.confirmed.len(), 2);
    assert_eq!(
        remote.calls(),
        vec![
            RemoteCall::Create { title: "A".into() },
            RemoteCall::Update {
                id: TaskId::new("task-1")
            },
        ]
    );
    assert_eq!(remote.task(&TaskId::new("task-1")).unwrap().title, "A, renamed");
}

#[tokio::test]
async fn test_queue_is_global_fifo_across_entities() {
    let remote = Arc::new(MockRemoteStore::new());
    let store = open(&remote, &StoreConfig::default());
    store.set_online(false);

    let first = store
        .create_tasks(vec![NewTaskInput::titled("first")])
        .await
        .unwrap();
    let second = store
        .create_tasks(vec![NewTaskInput::titled("second")])
        .await
        .unwrap();
    store.delete_task(&first[0].id).await.unwrap();
    store
        .update_task(&second[0].id, TaskPatch::title("second, edited"))
        .await
        .unwrap();

    store.set_online(true);
    store.drain().await;
    assert_eq!(
        remote.calls(),
        vec![
            RemoteCall::Create {
                title: "first".into()
            },
            RemoteCall::Create {
                title: "second".into()
            },
            RemoteCall::Delete {
                id: TaskId::new("task-1")
            },
            RemoteCall::Update {
                id: TaskId::new("task-2")
            },
        ]
    );
    let view = store.tasks();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].task.title, "second, edited");
}

#[tokio::test]
async fn test_drain_twice_is_a_no_op() {
    let remote = Arc::new(MockRemoteStore::new());
    let store = open(&remote, &StoreConfig::default());
    store.set_online(false);
    store
        .create_tasks(vec![NewTaskInput::titled("once")])
        .await
        .unwrap();

    store.set_online(true);
    store.drain().await;
    let after_first = store.tasks();
    let report = store.drain().await;
    assert!(report.confirmed.is_empty());
    assert_eq!(store.tasks(), after_first);
    assert_eq!(remote.create_calls(), 1);
}

#[tokio::test]
async fn test_replaying_confirmed_mutation_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::default().with_queue_dir(dir.path());
    let remote = Arc::new(MockRemoteStore::new());

    let store = open(&remote, &config);
    store.set_online(false);
    store
        .create_tasks(vec![NewTaskInput::titled("once")])
        .await
        .unwrap();
    let pending = store.pending_mutations();
    store.set_online(true);
    store.drain().await;
    store.close().unwrap();

    // Simulate a crash that left the confirmed mutation in the file.
    let persistence = QueuePersistence::new(dir.path(), "user-1");
    let saved = persistence.load().unwrap().unwrap();
    assert!(saved.confirmed.contains(&pending[0].mutation_id));
    let file = QueueFile {
        mutations: pending.clone().into_iter().collect(),
        ..saved
    };
    persistence.save(&file).unwrap();

    let reopened = open(&remote, &config);
    let report = reopened.drain().await;
    assert_eq!(report.skipped, vec![pending[0].mutation_id]);
    assert!(report.confirmed.is_empty());
    assert_eq!(remote.create_calls(), 1);
    assert!(reopened.pending_mutations().is_empty());
}

// ============================================================
// Events
// ============================================================

#[tokio::test]
async fn test_events_only_for_confirmed_transitions() {
    let remote = Arc::new(MockRemoteStore::new());
    let store = open(&remote, &StoreConfig::default());
    let mut events = store.subscribe();

    remote.fail_next(RemoteOp::Create, RemoteError::Network("timeout".into()));
    assert!(store
        .create_tasks(vec![NewTaskInput::titled("rolled back")])
        .await
        .is_err());

    store.set_online(false);
    store
        .create_tasks(vec![NewTaskInput::titled("queued")])
        .await
        .unwrap();
    assert!(events.try_recv().is_err());

    store.set_online(true);
    store.drain().await;
    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, TaskEventKind::Created);
    assert_eq!(event.task.title, "queued");
    assert!(events.try_recv().is_err());
}

// ============================================================
// Per-entity serialization
// ============================================================

#[tokio::test]
async fn test_second_update_waits_for_first() {
    let remote = Arc::new(MockRemoteStore::new());
    let store = open(&remote, &StoreConfig::default());
    let created = store
        .create_tasks(vec![NewTaskInput::titled("shared")])
        .await
        .unwrap();
    let id = created[0].id.clone();

    remote.close_gate();
    let first = {
        let store = Arc::clone(&store);
        let id = id.clone();
        tokio::spawn(async move { store.update_task(&id, TaskPatch::title("first")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = {
        let store = Arc::clone(&store);
        let id = id.clone();
        tokio::spawn(async move {
            let patch = TaskPatch {
                category: Some(Some("Errands".into())),
                ..TaskPatch::default()
            };
            store.update_task(&id, patch).await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(remote.update_calls(), 1);
    assert_eq!(store.get(&id).unwrap().task.title, "first");
    assert_eq!(store.get(&id).unwrap().task.category, None);

    remote.open_gate();
    first.await.unwrap().unwrap();
    let task = second.await.unwrap().unwrap();
    assert_eq!(task.title, "first");
    assert_eq!(task.category.as_deref(), Some("Errands"));
}

#[tokio::test]
async fn test_independent_entities_run_concurrently() {
    let remote = Arc::new(MockRemoteStore::new());
    let store = open(&remote, &StoreConfig::default());
    let created = store
        .create_tasks(vec![NewTaskInput::titled("a"), NewTaskInput::titled("b")])
        .await
        .unwrap();

    remote.close_gate();
    let handles: Vec<_> = created
        .iter()
        .map(|task| {
            let store = Arc::clone(&store);
            let id = task.id.clone();
            tokio::spawn(async move { store.update_task(&id, TaskPatch::title("edited")).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(remote.update_calls(), 2);

    remote.open_gate();
    for result in join_all(handles).await {
        assert_eq!(result.unwrap().unwrap().title, "edited");
    }
}

// ============================================================
// Sessions
// ============================================================

#[tokio::test]
async fn test_sessions_are_isolated() {
    let remote = Arc::new(MockRemoteStore::new());
    let a = open(&remote, &StoreConfig::default());
    let b = Arc::new(
        OptimisticTaskStore::open("user-2", remote.clone(), &StoreConfig::default()).unwrap(),
    );

    a.set_online(false);
    a.create_tasks(vec![NewTaskInput::titled("mine")])
        .await
        .unwrap();
    assert_eq!(a.len(), 1);
    assert!(b.is_empty());
    assert!(b.pending_mutations().is_empty());
    assert!(b.is_online());
}

#[tokio::test]
async fn test_offline_queue_persists_across_sessions() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::default().with_queue_dir(dir.path());
    let remote = Arc::new(MockRemoteStore::new());

    let store = open(&remote, &config);
    store.set_online(false);
    store
        .create_tasks(vec![NewTaskInput::titled("survives restart")])
        .await
        .unwrap();
    store.close().unwrap();

    let reopened = open(&remote, &config);
    assert_eq!(reopened.pending_mutations().len(), 1);
    reopened.drain().await;
    assert_eq!(reopened.tasks()[0].task.title, "survives restart");
    assert!(reopened.pending_mutations().is_empty());
}
