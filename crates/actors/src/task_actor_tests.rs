// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use viban_core::{AgentStatus, Board, Column, ColumnHook, ColumnSettings, FakeClock, Hook, HookExecutionStatus, HookId, HookKind, Task};
use viban_engine::{HookResult, SystemHook, SystemHookRegistry};

use super::*;
use crate::repo_locator::StaticRepoLocator;

struct NoopAdapter;

#[async_trait]
impl viban_engine::AgentAdapter for NoopAdapter {
    async fn start(&self, _executor_id: &str, _prompt: &str, _working_directory: &Path, _auto_approve: bool) -> Result<String, EngineError> {
        Ok(String::new())
    }
}

struct InstantFail;
#[async_trait]
impl SystemHook for InstantFail {
    async fn execute(&self, _task: &Task, _column_name: &str, _opts: &HookOpts) -> HookResult {
        Err(EngineError::ExitCode { code: 1, output: "boom".into() })
    }
}

struct AwaitsExecutor;
#[async_trait]
impl SystemHook for AwaitsExecutor {
    async fn execute(&self, task: &Task, _column_name: &str, _opts: &HookOpts) -> HookResult {
        Ok(HookOutcome::AwaitExecutor { task_id: task.id })
    }
}

struct Fixture {
    store: Arc<viban_store::MemoryStore>,
    bus: Arc<EventBus>,
    board_id: BoardId,
    todo_col: ColumnId,
    in_progress_col: ColumnId,
    to_review_col: ColumnId,
}

fn setup_board(in_progress_settings: ColumnSettings) -> Fixture {
    let store = Arc::new(viban_store::MemoryStore::new(Box::new(FakeClock::default())));
    let board_id = BoardId::new();
    store.insert_board(Board::builder().id(board_id).name("Demo").build());

    let todo_col = ColumnId::new();
    let in_progress_col = ColumnId::new();
    let to_review_col = ColumnId::new();

    store.insert_column(
        Column::builder()
            .id(todo_col)
            .board_id(board_id)
            .name("TODO")
            .position(0)
            .build(),
    );
    store.insert_column(
        Column::builder()
            .id(in_progress_col)
            .board_id(board_id)
            .name("In Progress")
            .position(1)
            .settings(in_progress_settings)
            .build(),
    );
    store.insert_column(
        Column::builder()
            .id(to_review_col)
            .board_id(board_id)
            .name("To Review")
            .position(2)
            .build(),
    );

    Fixture {
        store,
        bus: Arc::new(EventBus::new()),
        board_id,
        todo_col,
        in_progress_col,
        to_review_col,
    }
}

fn attach_system_hook(
    fixture: &Fixture,
    column_id: ColumnId,
    hook_id: &str,
    hook_name: &str,
    transparent: bool,
    position: i64,
    registry: &mut SystemHookRegistry,
    system_hook: Arc<dyn SystemHook>,
) {
    let id = HookId::from_string(hook_id);
    fixture.store.insert_hook(
        Hook::builder()
            .id(id)
            .board_id(fixture.board_id)
            .name(hook_name)
            .kind(HookKind::System)
            .build(),
    );
    fixture.store.insert_column_hook(
        ColumnHook::builder()
            .column_id(column_id)
            .hook_id(id)
            .position(position)
            .transparent(transparent)
            .build(),
    );
    registry.register(hook_id.to_string(), system_hook);
}

fn make_deps(fixture: &Fixture, registry: SystemHookRegistry) -> TaskActorDeps<NoopAdapter> {
    TaskActorDeps {
        data: fixture.store.clone(),
        log: fixture.store.clone(),
        hook_runner: Arc::new(HookRunner::new(Arc::new(NoopAdapter), registry)),
        worktree_manager: Arc::new(WorktreeManager::new(std::env::temp_dir())),
        repo_locator: Arc::new(StaticRepoLocator::new()),
        semaphores: Arc::new(ColumnSemaphoreRegistry::new()),
        bus: fixture.bus.clone(),
        clock: Arc::new(FakeClock::default()),
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

async fn move_task(fixture: &Fixture, handle: &TaskActorHandle, task_id: TaskId, target: ColumnId) {
    let mut task = fixture.store.get_task(task_id).await.unwrap().unwrap();
    task.column_id = target;
    handle.notify_task_updated(task).await;
}

#[tokio::test]
async fn happy_path_moves_task_to_to_review_on_success() {
    let fixture = setup_board(ColumnSettings {
        hooks_enabled: true,
        max_concurrent_tasks: Some(1),
    });
    let mut registry = SystemHookRegistry::new();
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:execute-ai",
        "Execute AI",
        false,
        0,
        &mut registry,
        Arc::new(AwaitsExecutor),
    );
    let deps = make_deps(&fixture, registry);

    let task_id = TaskId::new();
    fixture
        .store
        .insert_task(Task::builder().id(task_id).column_id(fixture.todo_col).title("T1").build());

    let handle = TaskActor::spawn(fixture.board_id, task_id, fixture.todo_col, deps);
    move_task(&fixture, &handle, task_id, fixture.in_progress_col).await;

    wait_until(|| async { fixture.store.get_task(task_id).await.unwrap().unwrap().agent_status == AgentStatus::Executing }).await;
    handle.notify_executor_completed(0).await;

    wait_until(|| async {
        let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
        task.column_id == fixture.to_review_col && task.agent_status == AgentStatus::Idle
    })
    .await;

    let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.agent_status_message, "Completed successfully");

    let history = fixture.store.history_for_task(task_id).await.unwrap();
    let row = history.into_iter().find(|r| r.hook_name == "Execute AI").unwrap();
    assert_eq!(row.status, HookExecutionStatus::Completed);

    handle.shutdown().await;
}

#[tokio::test]
async fn non_transparent_failure_cancels_remaining_pipeline() {
    let fixture = setup_board(ColumnSettings {
        hooks_enabled: true,
        max_concurrent_tasks: None,
    });
    let mut registry = SystemHookRegistry::new();
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:lint",
        "Lint",
        false,
        0,
        &mut registry,
        Arc::new(InstantFail),
    );
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:execute-ai",
        "Execute AI",
        false,
        1,
        &mut registry,
        Arc::new(AwaitsExecutor),
    );

    let deps = make_deps(&fixture, registry);
    let task_id = TaskId::new();
    fixture
        .store
        .insert_task(Task::builder().id(task_id).column_id(fixture.todo_col).title("T2").build());
    let handle = TaskActor::spawn(fixture.board_id, task_id, fixture.todo_col, deps);
    move_task(&fixture, &handle, task_id, fixture.in_progress_col).await;

    wait_until(|| async {
        let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
        task.column_id == fixture.to_review_col
    })
    .await;

    let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.agent_status, AgentStatus::Error);
    assert!(task
        .error_message
        .unwrap()
        .starts_with("Hook 'Lint' failed with exit code 1"));

    let history = fixture.store.history_for_task(task_id).await.unwrap();
    let lint_row = history.iter().find(|r| r.hook_name == "Lint").unwrap();
    assert_eq!(lint_row.status, HookExecutionStatus::Failed);
    let execute_ai_row = history.iter().find(|r| r.hook_name == "Execute AI").unwrap();
    assert_eq!(execute_ai_row.status, HookExecutionStatus::Cancelled);

    handle.shutdown().await;
}

#[tokio::test]
async fn transparent_hook_failure_does_not_cancel_pipeline() {
    let fixture = setup_board(ColumnSettings {
        hooks_enabled: true,
        max_concurrent_tasks: None,
    });
    let mut registry = SystemHookRegistry::new();
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:notify",
        "Notify",
        true,
        0,
        &mut registry,
        Arc::new(InstantFail),
    );
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:execute-ai",
        "Execute AI",
        false,
        1,
        &mut registry,
        Arc::new(AwaitsExecutor),
    );

    let deps = make_deps(&fixture, registry);
    let task_id = TaskId::new();
    fixture
        .store
        .insert_task(Task::builder().id(task_id).column_id(fixture.todo_col).title("T3").build());
    let handle = TaskActor::spawn(fixture.board_id, task_id, fixture.todo_col, deps);
    move_task(&fixture, &handle, task_id, fixture.in_progress_col).await;

    wait_until(|| async { fixture.store.get_task(task_id).await.unwrap().unwrap().agent_status == AgentStatus::Executing }).await;
    handle.notify_executor_completed(0).await;

    wait_until(|| async {
        let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
        task.column_id == fixture.to_review_col
    })
    .await;

    let task = fixture.store.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.agent_status, AgentStatus::Idle);

    let history = fixture.store.history_for_task(task_id).await.unwrap();
    let notify_row = history.iter().find(|r| r.hook_name == "Notify").unwrap();
    assert_eq!(notify_row.status, HookExecutionStatus::Failed);
    let execute_ai_row = history.iter().find(|r| r.hook_name == "Execute AI").unwrap();
    assert_eq!(execute_ai_row.status, HookExecutionStatus::Completed);

    handle.shutdown().await;
}

#[tokio::test]
async fn concurrency_cap_queues_second_task_until_first_leaves() {
    let fixture = setup_board(ColumnSettings {
        hooks_enabled: true,
        max_concurrent_tasks: Some(1),
    });
    let mut registry = SystemHookRegistry::new();
    attach_system_hook(
        &fixture,
        fixture.in_progress_col,
        "system:long-running",
        "Long Running",
        false,
        0,
        &mut registry,
        Arc::new(AwaitsExecutor),
    );
    let deps = make_deps(&fixture, registry);

    let t4 = TaskId::new();
    let t5 = TaskId::new();
    fixture
        .store
        .insert_task(Task::builder().id(t4).column_id(fixture.todo_col).title("T4").build());
    fixture
        .store
        .insert_task(Task::builder().id(t5).column_id(fixture.todo_col).title("T5").build());

    let handle4 = TaskActor::spawn(fixture.board_id, t4, fixture.todo_col, deps.clone());
    let handle5 = TaskActor::spawn(fixture.board_id, t5, fixture.todo_col, deps);

    move_task(&fixture, &handle4, t4, fixture.in_progress_col).await;
    wait_until(|| async { fixture.store.get_task(t4).await.unwrap().unwrap().agent_status == AgentStatus::Executing }).await;

    move_task(&fixture, &handle5, t5, fixture.in_progress_col).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let t5_pending = fixture.store.pending_for_task(t5).await.unwrap();
    assert_eq!(t5_pending.len(), 1, "T5's hook row should stay pending while T4 holds the only slot");
    assert!(fixture.store.get_task(t5).await.unwrap().unwrap().agent_status != AgentStatus::Executing);

    handle4.notify_executor_completed(0).await;

    wait_until(|| async { fixture.store.pending_for_task(t5).await.unwrap().is_empty() }).await;
    wait_until(|| async { fixture.store.get_task(t5).await.unwrap().unwrap().agent_status == AgentStatus::Executing }).await;

    handle4.shutdown().await;
    handle5.shutdown().await;
}
