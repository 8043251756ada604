// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four reserved `system:*` hooks spec §6 names. Registered here, not in
//! `viban-engine`, because they need collaborators (an `AgentAdapter`, the
//! data layer, the EventBus) that crate has no business depending on — it
//! only defines the `SystemHook` seam.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use viban_actors::EventBus;
use viban_core::event::{executor_completed_topic, ExecutorCompleted, HookEffects, PlaySoundEffect};
use viban_core::{BoardId, Task};
use viban_engine::{AgentAdapter, EngineError, HookOpts, HookOutcome, HookResult, SystemHook};
use viban_store::{DataLayer, StoreError, TaskFieldUpdate};

fn store_err(err: StoreError) -> EngineError {
    EngineError::SystemHook(err.to_string())
}

fn build_prompt(task: &Task, column_name: &str, preamble: &str) -> String {
    format!(
        "{preamble}\n\n## Task\n\n{}\n\n{}\n\n## Column\n\n{column_name}",
        task.title, task.description
    )
}

/// `system:execute-ai`: starts the configured executor in the task's
/// worktree and backgrounds it. Per spec §4.2's system-hook codomain this
/// suspends the pipeline (`AwaitExecutor`) until the exit code is published
/// on `executor:<task_id>:completed` — the same topic
/// `TaskActor::handle_executor_completed` already subscribes to at creation.
pub struct ExecuteAiHook<A: AgentAdapter> {
    adapter: Arc<A>,
    bus: Arc<EventBus>,
}

impl<A: AgentAdapter> ExecuteAiHook<A> {
    pub fn new(adapter: Arc<A>, bus: Arc<EventBus>) -> Self {
        Self { adapter, bus }
    }
}

#[async_trait]
impl<A: AgentAdapter + 'static> SystemHook for ExecuteAiHook<A> {
    async fn execute(&self, task: &Task, column_name: &str, opts: &HookOpts) -> HookResult {
        let prompt = build_prompt(task, column_name, "Execute this task.");
        let working_directory = task.worktree_path.clone();
        let executor_id = format!("execute-ai:{}", task.id);
        let auto_approve = opts.auto_approve;
        let task_id = task.id;
        let adapter = self.adapter.clone();
        let bus = self.bus.clone();

        tokio::spawn(async move {
            let dir = working_directory.as_deref().map(Path::new).unwrap_or_else(|| Path::new("."));
            let exit_code = match adapter.start(&executor_id, &prompt, dir, auto_approve).await {
                Ok(_) => 0,
                Err(EngineError::ExecutorFailed(code)) => code,
                Err(err) => {
                    warn!(task = %task_id, %err, "system:execute-ai executor failed");
                    -1
                }
            };
            bus.publish(&executor_completed_topic(&task_id), ExecutorCompleted { task_id, exit_code });
        });

        Ok(HookOutcome::AwaitExecutor { task_id })
    }
}

/// `system:refine-prompt`: runs synchronously — it asks the executor to
/// rewrite the task's own prompt and completes immediately with the result,
/// rather than suspending for an `executor_completed`.
pub struct RefinePromptHook<A: AgentAdapter> {
    adapter: Arc<A>,
}

impl<A: AgentAdapter> RefinePromptHook<A> {
    pub fn new(adapter: Arc<A>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl<A: AgentAdapter + 'static> SystemHook for RefinePromptHook<A> {
    async fn execute(&self, task: &Task, column_name: &str, opts: &HookOpts) -> HookResult {
        let prompt = build_prompt(
            task,
            column_name,
            "Refine the following task description for clarity and actionability.",
        );
        let working_directory = task
            .worktree_path
            .as_deref()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("."));
        let executor_id = format!("refine-prompt:{}", task.id);
        let refined = self
            .adapter
            .start(&executor_id, &prompt, working_directory, opts.auto_approve)
            .await?;
        Ok(HookOutcome::completed(refined))
    }
}

/// `system:play-sound`: no I/O — reads `hook_settings.sound` and attaches a
/// [`PlaySoundEffect`] to the hook's completion so the UI's
/// `kanban_lite:board:<id>` subscriber knows which sound to play (spec §6
/// event wire format).
pub struct PlaySoundHook;

#[async_trait]
impl SystemHook for PlaySoundHook {
    async fn execute(&self, task: &Task, _column_name: &str, opts: &HookOpts) -> HookResult {
        let sound = opts
            .hook_settings
            .get("sound")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        info!(task = %task.id, sound, "system:play-sound");
        Ok(HookOutcome::Completed {
            output: String::new(),
            effects: HookEffects {
                play_sound: Some(PlaySoundEffect { sound }),
            },
        })
    }
}

/// `system:move-task`: moves the task directly through the data layer.
/// `hook_settings.target` is `"next"` (the board's next column by position)
/// or a column name, per Design Notes §9's `MoveTaskSettings{target: Next |
/// Named(String)}`. Deliberately does not publish a `TaskLifecycleEvent`
/// itself — per spec §6 that notification is the external data-layer
/// notifier's job, not this hook's.
pub struct MoveTaskHook {
    data: Arc<dyn DataLayer>,
}

impl MoveTaskHook {
    pub fn new(data: Arc<dyn DataLayer>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl SystemHook for MoveTaskHook {
    async fn execute(&self, task: &Task, _column_name: &str, opts: &HookOpts) -> HookResult {
        let target = opts
            .hook_settings
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or("next")
            .to_string();
        let board_id = BoardId::from_string(opts.board_id.clone());

        let target_column_id = if target.eq_ignore_ascii_case("next") {
            let current = self.data.get_column(task.column_id).await.map_err(store_err)?;
            let Some(current) = current else {
                return Err(EngineError::TaskNotFound);
            };
            let columns = self.data.list_columns_for_board(board_id).await.map_err(store_err)?;
            columns.into_iter().find(|c| c.position > current.position).map(|c| c.id)
        } else {
            self.data.find_column_by_name(board_id, &target).await.map_err(store_err)?.map(|c| c.id)
        };

        let Some(target_column_id) = target_column_id else {
            info!(task = %task.id, %target, "system:move-task: no matching column, leaving task in place");
            return Ok(HookOutcome::completed("no target column"));
        };

        self.data
            .update_task(
                task.id,
                TaskFieldUpdate {
                    column_id: Some(target_column_id),
                    ..Default::default()
                },
            )
            .await
            .map_err(store_err)?;

        Ok(HookOutcome::completed(format!("moved to {target_column_id}")))
    }
}

#[cfg(test)]
#[path = "system_hooks_tests.rs"]
mod tests;
