// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use viban_core::{Board, Column, ColumnSettings, FakeClock, Task};
use viban_engine::{EngineError, HookRunner, SystemHookRegistry, WorktreeManager};

use super::*;
use crate::repo_locator::StaticRepoLocator;
use crate::semaphore_registry::ColumnSemaphoreRegistry;

struct NoopAdapter;

#[async_trait]
impl viban_engine::AgentAdapter for NoopAdapter {
    async fn start(&self, _executor_id: &str, _prompt: &str, _working_directory: &Path, _auto_approve: bool) -> Result<String, EngineError> {
        Ok(String::new())
    }
}

struct Fixture {
    store: Arc<viban_store::MemoryStore>,
    bus: Arc<EventBus>,
    board_id: BoardId,
    tracked_col: ColumnId,
    other_board_col: ColumnId,
}

fn setup() -> Fixture {
    let store = Arc::new(viban_store::MemoryStore::new(Box::new(FakeClock::default())));
    let board_id = BoardId::new();
    store.insert_board(Board::builder().id(board_id).name("Demo").build());

    let tracked_col = ColumnId::new();
    store.insert_column(
        Column::builder()
            .id(tracked_col)
            .board_id(board_id)
            .name("TODO")
            .position(0)
            .settings(ColumnSettings {
                hooks_enabled: false,
                max_concurrent_tasks: None,
            })
            .build(),
    );

    let other_board = BoardId::new();
    let other_board_col = ColumnId::new();
    store.insert_column(
        Column::builder()
            .id(other_board_col)
            .board_id(other_board)
            .name("Elsewhere")
            .position(0)
            .build(),
    );

    Fixture {
        store,
        bus: Arc::new(EventBus::new()),
        board_id,
        tracked_col,
        other_board_col,
    }
}

fn make_deps(fixture: &Fixture) -> BoardActorDeps<NoopAdapter> {
    let task_actor_deps = TaskActorDeps {
        data: fixture.store.clone(),
        log: fixture.store.clone(),
        hook_runner: Arc::new(HookRunner::new(Arc::new(NoopAdapter), SystemHookRegistry::new())),
        worktree_manager: Arc::new(WorktreeManager::new(std::env::temp_dir())),
        repo_locator: Arc::new(StaticRepoLocator::new()),
        semaphores: Arc::new(ColumnSemaphoreRegistry::new()),
        bus: fixture.bus.clone(),
        clock: Arc::new(FakeClock::default()),
    };
    BoardActorDeps {
        data: fixture.store.clone(),
        bus: fixture.bus.clone(),
        task_registry: Arc::new(Registry::new()),
        task_actor_deps,
    }
}

async fn wait_until<Fut: Future<Output = bool>>(mut check: impl FnMut() -> Fut) {
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition did not become true within the test timeout");
}

#[tokio::test]
async fn task_created_in_tracked_column_spawns_a_task_actor() {
    let fixture = setup();
    let deps = make_deps(&fixture);
    let registry = deps.task_registry.clone();
    let handle = BoardActor::spawn(fixture.board_id, deps);

    let task_id = TaskId::new();
    let task = Task::builder().id(task_id).column_id(fixture.tracked_col).title("T1").build();
    fixture.store.insert_task(task.clone());
    fixture
        .bus
        .publish(TASK_UPDATES_TOPIC, TaskLifecycleEvent::TaskCreated { task });

    wait_until(|| async { registry.lookup(&RegistryKey::TaskActor(task_id)).is_some() }).await;

    handle.shutdown().await;
}

#[tokio::test]
async fn task_created_in_untracked_column_is_ignored() {
    let fixture = setup();
    let deps = make_deps(&fixture);
    let registry = deps.task_registry.clone();
    let handle = BoardActor::spawn(fixture.board_id, deps);

    let task_id = TaskId::new();
    let task = Task::builder().id(task_id).column_id(fixture.other_board_col).title("Elsewhere").build();
    fixture.store.insert_task(task.clone());
    fixture
        .bus
        .publish(TASK_UPDATES_TOPIC, TaskLifecycleEvent::TaskCreated { task });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(registry.lookup(&RegistryKey::TaskActor(task_id)).is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn task_deleted_shuts_down_its_task_actor() {
    let fixture = setup();
    let deps = make_deps(&fixture);
    let registry = deps.task_registry.clone();
    let handle = BoardActor::spawn(fixture.board_id, deps);

    let task_id = TaskId::new();
    let task = Task::builder().id(task_id).column_id(fixture.tracked_col).title("T2").build();
    fixture.store.insert_task(task.clone());
    fixture
        .bus
        .publish(TASK_UPDATES_TOPIC, TaskLifecycleEvent::TaskCreated { task });
    wait_until(|| async { registry.lookup(&RegistryKey::TaskActor(task_id)).is_some() }).await;

    fixture.store.delete_task(task_id);
    fixture
        .bus
        .publish(TASK_UPDATES_TOPIC, TaskLifecycleEvent::TaskDeleted { task_id });

    wait_until(|| async { registry.lookup(&RegistryKey::TaskActor(task_id)).is_none() }).await;

    handle.shutdown().await;
}

#[tokio::test]
async fn startup_loads_existing_tasks_in_tracked_columns() {
    let fixture = setup();
    let task_id = TaskId::new();
    fixture
        .store
        .insert_task(Task::builder().id(task_id).column_id(fixture.tracked_col).title("Preexisting").build());

    let deps = make_deps(&fixture);
    let registry = deps.task_registry.clone();
    let handle = BoardActor::spawn(fixture.board_id, deps);

    wait_until(|| async { registry.lookup(&RegistryKey::TaskActor(task_id)).is_some() }).await;

    handle.shutdown().await;
}
