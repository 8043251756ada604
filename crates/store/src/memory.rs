// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process implementation of the data-layer traits and the hook
//! execution log, backed by `parking_lot::Mutex`-guarded maps — the same
//! shape as `oj-daemon`'s `MaterializedState`. Used by the daemon for
//! single-node/test deployments and by every `viban-actors` test so actor
//! behavior can be exercised without a Postgres instance.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use viban_core::{
    Board, BoardId, Clock, Column, ColumnHook, ColumnHookId, ColumnId, Hook, HookExecution, HookId, SystemClock, Task,
    TaskId,
};

use crate::error::StoreError;
use crate::hook_execution_log::{HookExecutionLog, QueueSnapshot};
use crate::repository::{BoardRepository, ColumnHookAttachment, ColumnHookRepository, ColumnRepository, TaskFieldUpdate, TaskRepository};

#[derive(Default)]
struct Tables {
    boards: HashMap<BoardId, Board>,
    columns: HashMap<ColumnId, Column>,
    hooks: HashMap<HookId, Hook>,
    column_hooks: HashMap<ColumnHookId, ColumnHook>,
    tasks: HashMap<TaskId, Task>,
    executions: HashMap<String, HookExecution>,
    snapshots: HashMap<TaskId, QueueSnapshot>,
}

/// In-memory data layer + hook execution log, seeded directly by tests via
/// [`MemoryStore::insert_board`] and friends rather than a SQL fixture file.
pub struct MemoryStore {
    clock: Box<dyn Clock>,
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn insert_board(&self, board: Board) {
        self.tables.lock().boards.insert(board.id, board);
    }

    pub fn insert_column(&self, column: Column) {
        self.tables.lock().columns.insert(column.id, column);
    }

    pub fn insert_hook(&self, hook: Hook) {
        self.tables.lock().hooks.insert(hook.id, hook);
    }

    pub fn insert_column_hook(&self, column_hook: ColumnHook) {
        self.tables.lock().column_hooks.insert(column_hook.id, column_hook);
    }

    pub fn insert_task(&self, task: Task) {
        self.tables.lock().tasks.insert(task.id, task);
    }

    pub fn delete_board(&self, id: BoardId) {
        self.tables.lock().boards.remove(&id);
    }

    pub fn delete_task(&self, id: TaskId) {
        self.tables.lock().tasks.remove(&id);
    }
}

#[async_trait]
impl BoardRepository for MemoryStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        Ok(self.tables.lock().boards.values().cloned().collect())
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        Ok(self.tables.lock().boards.get(&id).cloned())
    }
}

#[async_trait]
impl ColumnRepository for MemoryStore {
    async fn get_column(&self, id: ColumnId) -> Result<Option<Column>, StoreError> {
        Ok(self.tables.lock().columns.get(&id).cloned())
    }

    async fn list_columns_for_board(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError> {
        let mut cols: Vec<Column> = self
            .tables
            .lock()
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        cols.sort_by_key(|c| c.position);
        Ok(cols)
    }
}

#[async_trait]
impl ColumnHookRepository for MemoryStore {
    async fn list_column_hooks_for_column(
        &self,
        column_id: ColumnId,
    ) -> Result<Vec<ColumnHookAttachment>, StoreError> {
        let tables = self.tables.lock();
        let mut attachments: Vec<ColumnHookAttachment> = tables
            .column_hooks
            .values()
            .filter(|ch| ch.column_id == column_id)
            .filter_map(|ch| {
                tables.hooks.get(&ch.hook_id).map(|hook| ColumnHookAttachment {
                    column_hook: ch.clone(),
                    hook: hook.clone(),
                })
            })
            .collect();
        attachments.sort_by_key(|a| a.column_hook.position);
        Ok(attachments)
    }

    async fn get_hook(&self, id: HookId) -> Result<Option<Hook>, StoreError> {
        Ok(self.tables.lock().hooks.get(&id).cloned())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.lock().tasks.get(&id).cloned())
    }

    async fn list_tasks_by_columns(&self, column_ids: &[ColumnId]) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tables
            .lock()
            .tasks
            .values()
            .filter(|t| column_ids.contains(&t.column_id))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: TaskId, update: TaskFieldUpdate) -> Result<Task, StoreError> {
        let mut tables = self.tables.lock();
        let task = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("task", id.to_string()))?;
        update.apply(task);
        Ok(task.clone())
    }
}

#[async_trait]
impl HookExecutionLog for MemoryStore {
    async fn queue(
        &self,
        task_id: TaskId,
        column_hook_id: Option<ColumnHookId>,
        hook_id: HookId,
        hook_name: &str,
        triggering_column_id: ColumnId,
        hook_settings: Map<String, Value>,
    ) -> Result<HookExecution, StoreError> {
        let row = HookExecution::new(
            task_id,
            column_hook_id,
            hook_id,
            hook_name,
            triggering_column_id,
            hook_settings,
            self.clock.utc_now(),
        );
        self.tables.lock().executions.insert(row.id.to_string(), row.clone());
        Ok(row)
    }

    async fn start(&self, id: &str) -> Result<HookExecution, StoreError> {
        self.mutate(id, |row| row.start(self.clock.utc_now()))
    }

    async fn complete(&self, id: &str) -> Result<HookExecution, StoreError> {
        self.mutate(id, |row| row.complete(self.clock.utc_now()))
    }

    async fn fail(&self, id: &str, error_message: &str) -> Result<HookExecution, StoreError> {
        self.mutate(id, |row| row.fail(error_message, self.clock.utc_now()))
    }

    async fn cancel(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError> {
        self.mutate(id, |row| row.cancel(reason, self.clock.utc_now()))
    }

    async fn skip(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError> {
        self.mutate(id, |row| row.skip(reason, self.clock.utc_now()))
    }

    async fn pending_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        Ok(self.filter_executions(|row| {
            row.task_id == task_id && row.status == viban_core::HookExecutionStatus::Pending
        }))
    }

    async fn active_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        Ok(self.filter_executions(|row| row.task_id == task_id && row.status.is_active()))
    }

    async fn history_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        let mut rows = self.filter_executions(|row| row.task_id == task_id);
        rows.sort_by_key(|row| row.queued_at);
        Ok(rows)
    }

    async fn active_for_task_and_column(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
    ) -> Result<Vec<HookExecution>, StoreError> {
        Ok(self.filter_executions(|row| {
            row.task_id == task_id && row.triggering_column_id == column_id && row.status.is_active()
        }))
    }

    async fn set_queue_snapshot(&self, task_id: TaskId, snapshot: QueueSnapshot) -> Result<(), StoreError> {
        self.tables.lock().snapshots.insert(task_id, snapshot);
        Ok(())
    }

    async fn clear_queue_snapshot(&self, task_id: TaskId) -> Result<(), StoreError> {
        self.tables.lock().snapshots.remove(&task_id);
        Ok(())
    }

    async fn get_queue_snapshot(&self, task_id: TaskId) -> Result<Option<QueueSnapshot>, StoreError> {
        Ok(self.tables.lock().snapshots.get(&task_id).cloned())
    }
}

impl MemoryStore {
    fn mutate(&self, id: &str, f: impl FnOnce(&mut HookExecution)) -> Result<HookExecution, StoreError> {
        let mut tables = self.tables.lock();
        let row = tables
            .executions
            .get_mut(id)
            .ok_or_else(|| StoreError::ExecutionNotFound(id.to_string()))?;
        f(row);
        Ok(row.clone())
    }

    fn filter_executions(&self, predicate: impl Fn(&HookExecution) -> bool) -> Vec<HookExecution> {
        self.tables
            .lock()
            .executions
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
