// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use viban_core::{Board, Column, ColumnSettings, FakeClock, Task};
use viban_store::MemoryStore;

use super::*;

struct EchoAdapter;

#[async_trait]
impl AgentAdapter for EchoAdapter {
    async fn start(&self, _executor_id: &str, prompt: &str, _working_directory: &Path, _auto_approve: bool) -> Result<String, EngineError> {
        Ok(format!("echo: {prompt}"))
    }
}

struct FailingAdapter;

#[async_trait]
impl AgentAdapter for FailingAdapter {
    async fn start(&self, _executor_id: &str, _prompt: &str, _working_directory: &Path, _auto_approve: bool) -> Result<String, EngineError> {
        Err(EngineError::ExecutorFailed(7))
    }
}

#[tokio::test]
async fn execute_ai_suspends_then_publishes_completion() {
    let bus = Arc::new(EventBus::new());
    let hook = ExecuteAiHook::new(Arc::new(EchoAdapter), bus.clone());
    let task = Task::builder().build();
    let mut rx = bus.subscribe(&executor_completed_topic(&task.id));

    let outcome = hook.execute(&task, "In Progress", &HookOpts::default()).await.unwrap();
    assert!(matches!(outcome, HookOutcome::AwaitExecutor { task_id } if task_id == task.id));

    let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    match received {
        viban_actors::BusMessage::ExecutorCompleted(completed) => {
            assert_eq!(completed.task_id, task.id);
            assert_eq!(completed.exit_code, 0);
        }
        other => panic!("expected ExecutorCompleted, got {other:?}"),
    }
}

#[tokio::test]
async fn execute_ai_reports_nonzero_exit_code() {
    let bus = Arc::new(EventBus::new());
    let hook = ExecuteAiHook::new(Arc::new(FailingAdapter), bus.clone());
    let task = Task::builder().build();
    let mut rx = bus.subscribe(&executor_completed_topic(&task.id));

    hook.execute(&task, "In Progress", &HookOpts::default()).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    match received {
        viban_actors::BusMessage::ExecutorCompleted(completed) => assert_eq!(completed.exit_code, 7),
        other => panic!("expected ExecutorCompleted, got {other:?}"),
    }
}

#[tokio::test]
async fn refine_prompt_completes_synchronously() {
    let hook = RefinePromptHook::new(Arc::new(EchoAdapter));
    let task = Task::builder().title("fix bug").build();
    let outcome = hook.execute(&task, "Backlog", &HookOpts::default()).await.unwrap();
    match outcome {
        HookOutcome::Completed { output, .. } => assert!(output.starts_with("echo:")),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn play_sound_attaches_the_configured_sound_to_effects() {
    let hook = PlaySoundHook;
    let task = Task::builder().build();
    let mut opts = HookOpts::default();
    opts.hook_settings.insert("sound".to_string(), serde_json::json!("ding"));

    let outcome = hook.execute(&task, "Done", &opts).await.unwrap();
    match outcome {
        HookOutcome::Completed { effects, .. } => {
            assert_eq!(effects.play_sound.unwrap().sound, "ding");
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn play_sound_defaults_when_no_setting_present() {
    let hook = PlaySoundHook;
    let task = Task::builder().build();
    let outcome = hook.execute(&task, "Done", &HookOpts::default()).await.unwrap();
    match outcome {
        HookOutcome::Completed { effects, .. } => assert_eq!(effects.play_sound.unwrap().sound, "default"),
        other => panic!("expected Completed, got {other:?}"),
    }
}

fn seeded_store() -> (Arc<MemoryStore>, Board, Column, Column) {
    let store = Arc::new(MemoryStore::new(Box::new(FakeClock::default())));
    let board = Board::builder().name("Eng").build();
    let todo = Column::builder().board_id(board.id).name("TODO").position(0).build();
    let in_progress = Column::builder()
        .board_id(board.id)
        .name("In Progress")
        .position(1)
        .settings(ColumnSettings { hooks_enabled: true, max_concurrent_tasks: None })
        .build();
    store.insert_board(board.clone());
    store.insert_column(todo.clone());
    store.insert_column(in_progress.clone());
    (store, board, todo, in_progress)
}

#[tokio::test]
async fn move_task_next_advances_to_the_following_column_by_position() {
    let (store, board, todo, in_progress) = seeded_store();
    let task = Task::builder().column_id(todo.id).build();
    store.insert_task(task.clone());

    let hook = MoveTaskHook::new(store.clone());
    let opts = HookOpts {
        board_id: board.id.to_string(),
        ..Default::default()
    };
    hook.execute(&task, "TODO", &opts).await.unwrap();

    let moved = store.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(moved.column_id, in_progress.id);
}

#[tokio::test]
async fn move_task_named_target_resolves_by_column_name() {
    let (store, board, _todo, in_progress) = seeded_store();
    let task = Task::builder().column_id(in_progress.id).build();
    store.insert_task(task.clone());

    let hook = MoveTaskHook::new(store.clone());
    let mut opts = HookOpts {
        board_id: board.id.to_string(),
        ..Default::default()
    };
    opts.hook_settings.insert("target".to_string(), serde_json::json!("todo"));
    hook.execute(&task, "In Progress", &opts).await.unwrap();

    let moved = store.get_task(task.id).await.unwrap().unwrap();
    assert_ne!(moved.column_id, in_progress.id);
}

#[tokio::test]
async fn move_task_with_no_matching_target_leaves_task_in_place() {
    let (store, board, _todo, in_progress) = seeded_store();
    let task = Task::builder().column_id(in_progress.id).build();
    store.insert_task(task.clone());

    let hook = MoveTaskHook::new(store.clone());
    let mut opts = HookOpts {
        board_id: board.id.to_string(),
        ..Default::default()
    };
    opts.hook_settings.insert("target".to_string(), serde_json::json!("nonexistent"));
    let outcome = hook.execute(&task, "In Progress", &opts).await.unwrap();
    assert!(matches!(outcome, HookOutcome::Completed { .. }));

    let unchanged = store.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(unchanged.column_id, in_progress.id);
}
