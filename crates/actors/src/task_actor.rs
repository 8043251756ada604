// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskActor (C5): drives the command queue for one task, owns its worktree,
//! and publishes status. One tokio task per instance, a single mpsc mailbox
//! for external messages, and `tokio::sync::broadcast` subscriptions for the
//! two per-task topics — the Rust rendition of "mailboxes with selective
//! receive" spec Design Notes §9 calls for: the actor inspects every
//! delivered message (mailbox, `task:<id>:execute`, `executor:<id>:completed`)
//! in its own `select!` loop and defers whichever it isn't ready to handle by
//! simply not acting on it, rather than literally suspending receive.
//!
//! Simplification: the actor always subscribes to `executor:<id>:completed`
//! at creation rather than only after an `executor_started_externally`
//! message (spec §4.5 external messages) — a stale completion is already a
//! no-op per the `awaiting_executor_hook_id` guard in [`TaskActor::handle_executor_completed`],
//! so there is no observable difference and no second subscribe/unsubscribe
//! dance to get right.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use viban_core::event::{
    board_topic, executor_completed_topic, task_execute_topic, ExecutorCompleted, HookEffects,
    HookExecutedNotification, HookExecutedResult, TaskExecuteSignal,
};
use viban_core::hook_execution::skip_reason;
use viban_core::{AgentStatus, BoardId, Clock, Column, ColumnHook, ColumnId, Hook, Task, TaskId};
use viban_engine::{AgentAdapter, Admission, Command, CommandKind, CommandQueue, EngineError, HookOpts, HookOutcome, HookRunner, WorktreeManager};
use viban_store::{ColumnHookAttachment, DataLayer, HookExecutionLog, QueueSnapshot, QueueSnapshotEntry, TaskFieldUpdate};

use crate::event_bus::{BusMessage, EventBus};
use crate::repo_locator::RepoLocator;
use crate::semaphore_registry::ColumnSemaphoreRegistry;

/// Shared collaborators every TaskActor needs, bundled so BoardActor doesn't
/// have to thread eight constructor arguments through every spawn call.
pub struct TaskActorDeps<A: AgentAdapter> {
    pub data: Arc<dyn DataLayer>,
    pub log: Arc<dyn HookExecutionLog>,
    pub hook_runner: Arc<HookRunner<A>>,
    pub worktree_manager: Arc<WorktreeManager>,
    pub repo_locator: Arc<dyn RepoLocator>,
    pub semaphores: Arc<ColumnSemaphoreRegistry>,
    pub bus: Arc<EventBus>,
    pub clock: Arc<dyn Clock>,
}

impl<A: AgentAdapter> Clone for TaskActorDeps<A> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            log: self.log.clone(),
            hook_runner: self.hook_runner.clone(),
            worktree_manager: self.worktree_manager.clone(),
            repo_locator: self.repo_locator.clone(),
            semaphores: self.semaphores.clone(),
            bus: self.bus.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// External messages a TaskActor accepts (spec §4.5 "External messages").
pub enum TaskActorMessage {
    TaskUpdated(Task),
    ExecutorStartedExternally,
    ExecutorCompleted { exit_code: i32 },
    Shutdown,
}

/// Cheap, cloneable sender side of a running TaskActor's mailbox.
#[derive(Clone)]
pub struct TaskActorHandle {
    task_id: TaskId,
    sender: mpsc::Sender<TaskActorMessage>,
}

impl TaskActorHandle {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub async fn notify_task_updated(&self, task: Task) {
        let _ = self.sender.send(TaskActorMessage::TaskUpdated(task)).await;
    }

    pub async fn notify_executor_started_externally(&self) {
        let _ = self.sender.send(TaskActorMessage::ExecutorStartedExternally).await;
    }

    pub async fn notify_executor_completed(&self, exit_code: i32) {
        let _ = self.sender.send(TaskActorMessage::ExecutorCompleted { exit_code }).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(TaskActorMessage::Shutdown).await;
    }
}

/// Drives one task's command queue. Exclusively owns the task's worktree
/// path/branch and in-flight execution state while it's alive (spec §3
/// invariant: "Task belongs to exactly one column at all times" /
/// "at most one TaskActor exists per task id").
pub struct TaskActor<A: AgentAdapter> {
    board_id: BoardId,
    task_id: TaskId,
    current_column_id: ColumnId,
    worktree_path: Option<String>,
    worktree_branch: Option<String>,
    current_hook_name: Option<String>,
    command_queue: CommandQueue,
    executor_running: bool,
    awaiting_executor_hook_id: Option<viban_core::ColumnHookId>,
    /// Executable `(column_hook, hook)` pairs resolved for the current
    /// column but not yet pushed into `command_queue` because the column's
    /// semaphore queued this task (§4.5.5 combined with §4.4).
    pending_admission: Option<Vec<(ColumnHook, Hook)>>,
    /// HookExecution row ids for the current entry wave, keyed by
    /// column_hook_id, so `hook_entry` execution transitions the row already
    /// created during entry-command resolution instead of creating a second one.
    execution_ids: HashMap<viban_core::ColumnHookId, String>,
    mailbox: mpsc::Receiver<TaskActorMessage>,
    execute_rx: broadcast::Receiver<BusMessage>,
    executor_rx: broadcast::Receiver<BusMessage>,
    deps: TaskActorDeps<A>,
}

impl<A: AgentAdapter + 'static> TaskActor<A> {
    /// Spawns the actor's run loop on a fresh tokio task and returns a handle
    /// to its mailbox. `initial_column_id` is the task's column at the
    /// moment a BoardActor first observes it.
    pub fn spawn(board_id: BoardId, task_id: TaskId, initial_column_id: ColumnId, deps: TaskActorDeps<A>) -> TaskActorHandle {
        let (sender, mailbox) = mpsc::channel(64);
        let execute_rx = deps.bus.subscribe(&task_execute_topic(&task_id));
        let executor_rx = deps.bus.subscribe(&executor_completed_topic(&task_id));

        let actor = TaskActor {
            board_id,
            task_id,
            current_column_id: initial_column_id,
            worktree_path: None,
            worktree_branch: None,
            current_hook_name: None,
            command_queue: CommandQueue::new(),
            executor_running: false,
            awaiting_executor_hook_id: None,
            pending_admission: None,
            execution_ids: HashMap::new(),
            mailbox,
            execute_rx,
            executor_rx,
            deps,
        };
        tokio::spawn(actor.run());
        TaskActorHandle { task_id, sender }
    }

    async fn run(mut self) {
        self.provision_worktree().await;
        if let Ok(Some(column)) = self.deps.data.get_column(self.current_column_id).await {
            if let Err(err) = self.resolve_entry_commands(&column).await {
                warn!(task = %self.task_id, %err, "entry-command resolution failed on startup");
            }
        }

        loop {
            self.drain_queue().await;

            if self.command_queue.is_idle() && self.pending_admission.is_none() {
                let _ = self.deps.log.clear_queue_snapshot(self.task_id).await;
            }

            tokio::select! {
                biased;

                maybe_msg = self.mailbox.recv() => {
                    match maybe_msg {
                        None | Some(TaskActorMessage::Shutdown) => break,
                        Some(msg) => self.handle_message(msg).await,
                    }
                }

                res = self.execute_rx.recv() => {
                    if let Ok(BusMessage::TaskExecute(TaskExecuteSignal { task_id })) = res {
                        if task_id == self.task_id {
                            self.admit_pending();
                        }
                    }
                }

                res = self.executor_rx.recv() => {
                    if let Ok(BusMessage::ExecutorCompleted(ExecutorCompleted { task_id, exit_code })) = res {
                        if task_id == self.task_id {
                            self.handle_executor_completed(exit_code).await;
                        }
                    }
                }
            }
        }

        self.teardown().await;
    }

    async fn handle_message(&mut self, msg: TaskActorMessage) {
        match msg {
            TaskActorMessage::TaskUpdated(task) => self.handle_task_updated(task).await,
            TaskActorMessage::ExecutorStartedExternally => {
                self.executor_running = true;
            }
            TaskActorMessage::ExecutorCompleted { exit_code } => {
                self.handle_executor_completed(exit_code).await
            }
            TaskActorMessage::Shutdown => unreachable!("Shutdown is handled before dispatch"),
        }
    }

    async fn handle_task_updated(&mut self, new_task: Task) {
        if new_task.column_id != self.current_column_id {
            self.perform_column_change(new_task.column_id).await;
        }
    }

    // ---- main loop / queue draining (§4.5) ----------------------------

    /// Pops and executes commands until the queue is empty or a command
    /// suspends (only `hook_entry` awaiting an executor does). No two
    /// commands ever run concurrently for this task.
    async fn drain_queue(&mut self) {
        loop {
            if self.command_queue.current().is_none() && self.command_queue.pop().is_none() {
                return;
            }
            let Some(kind) = self.command_queue.current_kind() else {
                return;
            };

            let suspended = match kind {
                CommandKind::HookEntry { column_hook, hook } => self.execute_hook_entry(column_hook, hook).await,
                CommandKind::MoveTask { target_column_id } => {
                    self.execute_move_task(target_column_id).await;
                    false
                }
                CommandKind::NotifySemaphoreLeave { column_id } => {
                    self.execute_notify_semaphore_leave(column_id).await;
                    false
                }
            };

            if suspended {
                return;
            }
            self.command_queue.complete_current();
        }
    }

    // ---- 4.5.1 hook_entry execution -----------------------------------

    async fn execute_hook_entry(&mut self, column_hook: ColumnHook, hook: Hook) -> bool {
        let row = match self.start_or_create_row(&column_hook, &hook).await {
            Some(row) => row,
            None => return false,
        };

        self.current_hook_name = Some(hook.name.clone());
        if !column_hook.transparent {
            let _ = self
                .update_task(TaskFieldUpdate {
                    agent_status: Some(AgentStatus::Executing),
                    agent_status_message: Some(format!("Executing {}", hook.name)),
                    in_progress: Some(true),
                    ..Default::default()
                })
                .await;
        }

        let task = match self.deps.data.get_task(self.task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                warn!(task = %self.task_id, "task vanished mid-hook, aborting command");
                let _ = self.deps.log.fail(&row, "task_not_found").await;
                self.current_hook_name = None;
                return false;
            }
            Err(err) => {
                warn!(task = %self.task_id, %err, "failed to load task snapshot for hook execution");
                return false;
            }
        };

        let column_name = self
            .deps
            .data
            .get_column(self.current_column_id)
            .await
            .ok()
            .flatten()
            .map(|c| c.name)
            .unwrap_or_default();

        let opts = HookOpts {
            board_id: self.board_id.to_string(),
            hook_settings: column_hook.hook_settings.clone(),
            auto_approve: true,
        };

        let outcome = self.deps.hook_runner.execute(&hook, &task, &column_name, opts).await;
        self.apply_hook_outcome(&row, &column_hook, &hook, outcome).await
    }

    async fn start_or_create_row(&mut self, column_hook: &ColumnHook, hook: &Hook) -> Option<String> {
        if let Some(row) = self.execution_ids.get(&column_hook.id).cloned() {
            return self.deps.log.start(&row).await.ok().map(|_| row);
        }

        let queued = self
            .deps
            .log
            .queue(
                self.task_id,
                Some(column_hook.id),
                hook.id,
                &hook.name,
                self.current_column_id,
                column_hook.hook_settings.clone(),
            )
            .await
            .ok()?;
        let row_id = queued.id.to_string();
        self.execution_ids.insert(column_hook.id, row_id.clone());
        self.deps.log.start(&row_id).await.ok()?;
        Some(row_id)
    }

    /// Returns `true` if execution should suspend (the command stays `current`).
    async fn apply_hook_outcome(
        &mut self,
        row_id: &str,
        column_hook: &ColumnHook,
        hook: &Hook,
        outcome: Result<HookOutcome, EngineError>,
    ) -> bool {
        match outcome {
            Ok(HookOutcome::Completed { effects, .. }) => {
                if column_hook.execute_once {
                    let _ = self
                        .update_task(TaskFieldUpdate {
                            add_executed_hook: Some(column_hook.id),
                            ..Default::default()
                        })
                        .await;
                }
                let _ = self.deps.log.complete(row_id).await;
                self.current_hook_name = None;
                self.restore_idle_if_executing(column_hook.transparent).await;
                self.publish_hook_executed(hook, HookExecutedResult::Ok, effects);
                false
            }
            Ok(HookOutcome::Skipped) => {
                let _ = self.deps.log.skip(row_id, skip_reason::WORKTREE_MISSING).await;
                self.current_hook_name = None;
                self.restore_idle_if_executing(column_hook.transparent).await;
                false
            }
            Ok(HookOutcome::AwaitExecutor { .. }) => {
                self.awaiting_executor_hook_id = Some(column_hook.id);
                self.executor_running = true;
                true
            }
            Err(err) => {
                let message = format_hook_error(hook, &err);
                let _ = self.deps.log.fail(row_id, &message).await;
                self.current_hook_name = None;

                if column_hook.transparent {
                    warn!(task = %self.task_id, hook = %hook.name, %message, "transparent hook failed, pipeline continues");
                } else {
                    let _ = self
                        .update_task(TaskFieldUpdate {
                            agent_status: Some(AgentStatus::Error),
                            agent_status_message: Some(message.clone()),
                            error_message: Some(Some(message.clone())),
                            in_progress: Some(false),
                            ..Default::default()
                        })
                        .await;
                    self.cancel_remaining(skip_reason::ERROR).await;
                    self.command_queue.clear();
                    self.pending_admission = None;
                    self.queue_move_to_to_review().await;
                }
                self.publish_hook_executed(hook, HookExecutedResult::Error, HookEffects::default());
                false
            }
        }
    }

    async fn restore_idle_if_executing(&mut self, transparent: bool) {
        if transparent {
            return;
        }
        if let Ok(Some(task)) = self.deps.data.get_task(self.task_id).await {
            if task.agent_status == AgentStatus::Executing {
                let _ = self
                    .update_task(TaskFieldUpdate {
                        agent_status: Some(AgentStatus::Idle),
                        in_progress: Some(false),
                        ..Default::default()
                    })
                    .await;
            }
        }
    }

    fn publish_hook_executed(&self, hook: &Hook, result: HookExecutedResult, effects: HookEffects) {
        self.deps.bus.publish(
            &board_topic(&self.board_id),
            HookExecutedNotification {
                hook_id: hook.id,
                hook_name: hook.name.clone(),
                task_id: self.task_id,
                triggering_column_id: self.current_column_id,
                result,
                effects,
            },
        );
    }

    // ---- 4.5.2 move_task execution -------------------------------------

    async fn execute_move_task(&mut self, target_column_id: ColumnId) {
        if target_column_id == self.current_column_id {
            return;
        }
        if let Err(err) = self
            .update_task(TaskFieldUpdate {
                column_id: Some(target_column_id),
                ..Default::default()
            })
            .await
        {
            warn!(task = %self.task_id, %err, "failed to persist move_task column change");
            return;
        }
        self.perform_column_change(target_column_id).await;
    }

    fn queue_move(&mut self, target_column_id: ColumnId) {
        self.command_queue.push_front(Command::move_task(target_column_id));
    }

    async fn queue_move_to_to_review(&mut self) {
        match self.deps.data.find_column_by_name(self.board_id, "To Review").await {
            Ok(Some(column)) => self.queue_move(column.id),
            Ok(None) => warn!(board_id = %self.board_id, "no \"To Review\" column found; task left in place"),
            Err(err) => warn!(board_id = %self.board_id, %err, "failed to resolve To Review column"),
        }
    }

    // ---- 4.5.3 executor completion -------------------------------------

    async fn handle_executor_completed(&mut self, exit_code: i32) {
        let Some(hook_id) = self.awaiting_executor_hook_id.take() else {
            debug!(task = %self.task_id, exit_code, "ignoring executor_completed with no awaiting hook");
            return;
        };
        self.executor_running = false;

        if let Some(row_id) = self.execution_ids.get(&hook_id).cloned() {
            if exit_code == 0 {
                let _ = self.deps.log.complete(&row_id).await;
            } else {
                let _ = self
                    .deps
                    .log
                    .fail(&row_id, &format!("executor exited with code {exit_code}"))
                    .await;
            }
        }
        self.current_hook_name = None;
        self.command_queue.complete_current();

        if exit_code == 0 {
            let _ = self
                .update_task(TaskFieldUpdate {
                    agent_status: Some(AgentStatus::Idle),
                    agent_status_message: Some("Completed successfully".to_string()),
                    in_progress: Some(false),
                    ..Default::default()
                })
                .await;
        } else {
            let message = format!("Failed with exit code {exit_code}");
            let _ = self
                .update_task(TaskFieldUpdate {
                    agent_status: Some(AgentStatus::Error),
                    agent_status_message: Some(message.clone()),
                    error_message: Some(Some(message)),
                    in_progress: Some(false),
                    ..Default::default()
                })
                .await;
        }

        self.queue_move_to_to_review().await;
    }

    // ---- 4.5.4 column change protocol ----------------------------------

    async fn perform_column_change(&mut self, new_column_id: ColumnId) {
        let old_column_id = self.current_column_id;
        if old_column_id == new_column_id {
            return;
        }

        if self.executor_running {
            if let Err(err) = self.deps.hook_runner.stop(self.task_id, skip_reason::COLUMN_CHANGE).await {
                warn!(task = %self.task_id, %err, "executor stop request failed, continuing anyway");
            }
            self.executor_running = false;
            self.awaiting_executor_hook_id = None;
            // The suspended `hook_entry` is still `current` (only
            // `handle_executor_completed` normally clears it); discard it here
            // too or `drain_queue` would re-run the cancelled hook in the new
            // column.
            self.command_queue.complete_current();
        }

        self.command_queue.clear();
        self.pending_admission = None;
        self.cancel_remaining(skip_reason::COLUMN_CHANGE).await;
        self.queue_notify_semaphore_leave(old_column_id);

        if let Ok(Some(column)) = self.deps.data.get_column(new_column_id).await {
            if let Err(err) = self.resolve_entry_commands(&column).await {
                warn!(task = %self.task_id, %err, "entry-command resolution failed after column change");
            }
        }

        self.current_column_id = new_column_id;
    }

    fn queue_notify_semaphore_leave(&mut self, column_id: ColumnId) {
        self.command_queue.push(Command::notify_semaphore_leave(column_id));
    }

    async fn execute_notify_semaphore_leave(&mut self, column_id: ColumnId) {
        let semaphore = self.deps.semaphores.get_or_create(column_id, None);
        if let Some(next_task_id) = semaphore.task_left_column(self.task_id) {
            self.deps
                .bus
                .publish(&task_execute_topic(&next_task_id), TaskExecuteSignal { task_id: next_task_id });
        }
    }

    /// Cancels every currently pending/running HookExecution row for this
    /// task, across all triggering columns (spec §4.5.4 step 3 /
    /// testable-properties "Cancellation").
    async fn cancel_remaining(&mut self, reason: &str) {
        let rows = match self.deps.log.active_for_task_all_columns(self.task_id).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(task = %self.task_id, %err, "failed to list active hook executions for cancellation");
                return;
            }
        };
        for row in rows {
            let _ = self.deps.log.cancel(&row.id.to_string(), reason).await;
        }
    }

    // ---- 4.5.5 entry-command resolution --------------------------------

    async fn resolve_entry_commands(&mut self, column: &Column) -> Result<(), viban_store::StoreError> {
        let task = match self.deps.data.get_task(self.task_id).await? {
            Some(task) => task,
            None => return Ok(()),
        };
        let attachments = self.deps.data.list_column_hooks_for_column(column.id).await?;
        let task_in_error = task.agent_status == AgentStatus::Error;

        let mut executable = Vec::new();
        let mut skipped = Vec::new();

        for ColumnHookAttachment { column_hook, hook } in attachments {
            if column_hook.execute_once && task.has_executed(column_hook.id) {
                continue;
            }
            if !column.settings.hooks_enabled {
                skipped.push((column_hook, hook, skip_reason::DISABLED));
            } else if task_in_error && !column_hook.transparent {
                skipped.push((column_hook, hook, skip_reason::ERROR));
            } else {
                executable.push((column_hook, hook));
            }
        }

        self.execution_ids.clear();
        let mut snapshot_entries = Vec::with_capacity(executable.len());
        for (column_hook, hook) in &executable {
            let row = self
                .deps
                .log
                .queue(
                    self.task_id,
                    Some(column_hook.id),
                    hook.id,
                    &hook.name,
                    column.id,
                    column_hook.hook_settings.clone(),
                )
                .await?;
            self.execution_ids.insert(column_hook.id, row.id.to_string());
            snapshot_entries.push(QueueSnapshotEntry {
                column_hook_id: column_hook.id,
                hook_id: hook.id,
                hook_name: hook.name.clone(),
                status: row.status,
                queued_at: row.queued_at,
            });
        }
        self.deps
            .log
            .set_queue_snapshot(self.task_id, QueueSnapshot { entries: snapshot_entries })
            .await?;

        for (column_hook, hook, reason) in skipped {
            let row = self
                .deps
                .log
                .queue(
                    self.task_id,
                    Some(column_hook.id),
                    hook.id,
                    &hook.name,
                    column.id,
                    column_hook.hook_settings.clone(),
                )
                .await?;
            self.deps.log.skip(&row.id.to_string(), reason).await?;
        }

        if executable.is_empty() {
            return Ok(());
        }

        let semaphore = self
            .deps
            .semaphores
            .get_or_create(column.id, column.settings.max_concurrent_tasks);
        match semaphore.acquire(self.task_id) {
            Admission::Granted => {
                for (column_hook, hook) in executable {
                    self.command_queue.push(Command::hook_entry(column_hook, hook));
                }
            }
            Admission::Queued => {
                info!(task = %self.task_id, column = %column.id, "queued behind column concurrency cap");
                self.pending_admission = Some(executable);
            }
        }

        Ok(())
    }

    fn admit_pending(&mut self) {
        if let Some(executable) = self.pending_admission.take() {
            for (column_hook, hook) in executable {
                self.command_queue.push(Command::hook_entry(column_hook, hook));
            }
        }
    }

    // ---- worktree + teardown --------------------------------------------

    async fn provision_worktree(&mut self) {
        let task = match self.deps.data.get_task(self.task_id).await {
            Ok(Some(task)) => task,
            _ => return,
        };
        if let Some(path) = task.worktree_path.clone() {
            self.worktree_path = Some(path);
            self.worktree_branch = task.worktree_branch.clone();
            return;
        }

        let repo = match self.deps.repo_locator.locate(self.board_id).await {
            Ok(repo) => repo,
            Err(err) => {
                debug!(task = %self.task_id, %err, "no repo location; skipping worktree provisioning");
                return;
            }
        };

        match self
            .deps
            .worktree_manager
            .create_worktree(&self.board_id, &self.task_id, &repo, task.custom_branch_name.as_deref())
            .await
        {
            Ok(created) => {
                let path = created.path.display().to_string();
                self.worktree_path = Some(path.clone());
                self.worktree_branch = Some(created.branch.clone());
                let _ = self
                    .update_task(TaskFieldUpdate {
                        worktree_path: Some(Some(path)),
                        worktree_branch: Some(Some(created.branch)),
                        ..Default::default()
                    })
                    .await;
            }
            Err(err) => warn!(task = %self.task_id, %err, "worktree provisioning failed"),
        }
    }

    /// Removes the worktree only if the task no longer exists, per spec §3's
    /// TaskActor lifecycle note.
    async fn teardown(&mut self) {
        if let Ok(None) = self.deps.data.get_task(self.task_id).await {
            if let (Some(path), Some(branch)) = (self.worktree_path.clone(), self.worktree_branch.clone()) {
                self.deps
                    .worktree_manager
                    .remove_worktree(&self.task_id, Path::new(&path), &branch)
                    .await;
            }
        }
    }

    async fn update_task(&self, update: TaskFieldUpdate) -> Result<Task, viban_store::StoreError> {
        self.deps.data.update_task(self.task_id, update).await
    }
}

fn format_hook_error(hook: &Hook, err: &EngineError) -> String {
    match err {
        EngineError::ExitCode { code, .. } => format!("Hook '{}' failed with exit code {code}", hook.name),
        other => format!("Hook '{}' failed: {other}", hook.name),
    }
}

#[cfg(test)]
#[path = "task_actor_tests.rs"]
mod tests;
