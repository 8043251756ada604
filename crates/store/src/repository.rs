// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Narrow data-layer interface consumed by the core (spec §6): the set of
//! reads and the single partial-update write a `TaskActor`/`BoardActor`
//! needs, without exposing the full Kanban CRUD surface (out of scope per
//! spec §1 — that lives in the external Ash/Postgres layer this crate only
//! has a trait boundary with).

use async_trait::async_trait;
use viban_core::{AgentStatus, Board, BoardId, Column, ColumnHook, ColumnHookId, ColumnId, Hook, HookId, Task, TaskId};

use crate::error::StoreError;

#[async_trait]
pub trait BoardRepository: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError>;
    async fn get_board(&self, id: BoardId) -> Result<Option<Board>, StoreError>;
}

#[async_trait]
pub trait ColumnRepository: Send + Sync {
    async fn get_column(&self, id: ColumnId) -> Result<Option<Column>, StoreError>;

    /// Columns belonging to a board, ascending by `position`. Used on
    /// `BoardActor` startup to cache column membership and to resolve the
    /// board's "To Review" column by name.
    async fn list_columns_for_board(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError>;

    /// Convenience built on [`ColumnRepository::list_columns_for_board`]: the
    /// first column (by `position`) whose name matches case-insensitively.
    /// §4.5.3/§4.5.1 both move a task to "the board's To Review column" by
    /// name, not by a dedicated id field on `Board`.
    async fn find_column_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<Column>, StoreError> {
        let needle = name.to_ascii_lowercase();
        Ok(self
            .list_columns_for_board(board_id)
            .await?
            .into_iter()
            .find(|c| c.name.to_ascii_lowercase() == needle))
    }
}

/// A hook's attachment to a column, joined with the hook it references —
/// everything `HookRunner::execute` and entry-command resolution (§4.5.5)
/// need about one pipeline step.
#[derive(Debug, Clone)]
pub struct ColumnHookAttachment {
    pub column_hook: ColumnHook,
    pub hook: Hook,
}

#[async_trait]
pub trait ColumnHookRepository: Send + Sync {
    /// Attachments for one column, ascending by `column_hook.position` — the
    /// pipeline execution order (§3 "Positions form a total order").
    async fn list_column_hooks_for_column(
        &self,
        column_id: ColumnId,
    ) -> Result<Vec<ColumnHookAttachment>, StoreError>;

    async fn get_hook(&self, id: HookId) -> Result<Option<Hook>, StoreError>;
}

/// Partial update for [`Task`], matching the field list spec §6 names for
/// `update_task`. `Option<Option<T>>` fields distinguish "leave unchanged"
/// (`None`) from "set to null" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskFieldUpdate {
    pub agent_status: Option<AgentStatus>,
    pub agent_status_message: Option<String>,
    pub in_progress: Option<bool>,
    pub error_message: Option<Option<String>>,
    pub worktree_path: Option<Option<String>>,
    pub worktree_branch: Option<Option<String>>,
    pub column_id: Option<ColumnId>,
    pub add_executed_hook: Option<ColumnHookId>,
}

impl TaskFieldUpdate {
    pub fn apply(&self, task: &mut Task) {
        if let Some(v) = self.agent_status {
            task.agent_status = v;
        }
        if let Some(v) = &self.agent_status_message {
            task.agent_status_message = v.clone();
        }
        if let Some(v) = self.in_progress {
            task.in_progress = v;
        }
        if let Some(v) = &self.error_message {
            task.error_message = v.clone();
        }
        if let Some(v) = &self.worktree_path {
            task.worktree_path = v.clone();
        }
        if let Some(v) = &self.worktree_branch {
            task.worktree_branch = v.clone();
        }
        if let Some(v) = self.column_id {
            task.column_id = v;
        }
        if let Some(v) = self.add_executed_hook {
            task.mark_executed(v);
        }
    }
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Tasks currently sitting in any of `column_ids` — how a `BoardActor`
    /// discovers its board's tasks on startup (§4.6 "On startup, load all
    /// existing tasks whose column is in the board").
    async fn list_tasks_by_columns(&self, column_ids: &[ColumnId]) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: TaskId, update: TaskFieldUpdate) -> Result<Task, StoreError>;
}

/// Everything the core needs from the external data layer, bundled for
/// convenience. Implementors only need to provide the four narrower traits.
pub trait DataLayer: BoardRepository + ColumnRepository + ColumnHookRepository + TaskRepository {}

impl<T> DataLayer for T where T: BoardRepository + ColumnRepository + ColumnHookRepository + TaskRepository {}
