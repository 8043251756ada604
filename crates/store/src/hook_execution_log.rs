// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HookExecutionLog (C10): the durable, append-mostly record of every hook's
//! pending→terminal transition, plus the per-task "queue snapshot" the UI
//! reads to show what's about to run and what's running right now (§4.10).
//!
//! The log only records transitions a `TaskActor` asks for; it never
//! initiates one itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use viban_core::{ColumnHookId, ColumnId, HookExecution, HookExecutionStatus, HookId, TaskId};

use crate::error::StoreError;

/// One entry in a task's pending queue snapshot (§4.5.5 step 1: "Writes a
/// pending queue snapshot listing every hook it intends to run").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshotEntry {
    pub column_hook_id: ColumnHookId,
    pub hook_id: HookId,
    pub hook_name: String,
    pub status: HookExecutionStatus,
    pub queued_at: DateTime<Utc>,
}

/// The authoritative "what is about to happen and what is running right now"
/// view a `TaskActor` overwrites on entry-command resolution and clears on
/// drain (§4.10).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueSnapshotEntry>,
}

#[async_trait]
pub trait HookExecutionLog: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn queue(
        &self,
        task_id: TaskId,
        column_hook_id: Option<ColumnHookId>,
        hook_id: HookId,
        hook_name: &str,
        triggering_column_id: ColumnId,
        hook_settings: Map<String, Value>,
    ) -> Result<HookExecution, StoreError>;

    async fn start(&self, id: &str) -> Result<HookExecution, StoreError>;
    async fn complete(&self, id: &str) -> Result<HookExecution, StoreError>;
    async fn fail(&self, id: &str, error_message: &str) -> Result<HookExecution, StoreError>;
    async fn cancel(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError>;
    async fn skip(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError>;

    async fn pending_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError>;
    async fn active_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError>;
    async fn history_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError>;
    async fn active_for_task_and_column(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
    ) -> Result<Vec<HookExecution>, StoreError>;

    /// Every non-terminal row for a task, regardless of triggering column —
    /// what a column change (§4.5.4 step 3) cancels.
    async fn active_for_task_all_columns(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        Ok(self
            .active_for_task(task_id)
            .await?
            .into_iter()
            .filter(|e| e.status.is_active())
            .collect())
    }

    async fn set_queue_snapshot(&self, task_id: TaskId, snapshot: QueueSnapshot) -> Result<(), StoreError>;
    async fn clear_queue_snapshot(&self, task_id: TaskId) -> Result<(), StoreError>;
    async fn get_queue_snapshot(&self, task_id: TaskId) -> Result<Option<QueueSnapshot>, StoreError>;
}
