// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed data layer, grounded on `tryemerge-vibe-kanban-sm`'s
//! `db::DBService` (pool construction, migrations-on-connect) and its
//! `models::task`/`models::kanban_column` row shapes. Queries are built with
//! runtime `query_as`/`bind` rather than `oj-daemon`'s compile-time
//! `query!`/`query_as!` macros: those require a live database (or a checked-
//! in `.sqlx` offline cache) at crate build time, which this workspace has
//! no way to provision.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use viban_core::{
    AgentStatus, Board, BoardId, Column, ColumnHook, ColumnHookId, ColumnId, ColumnSettings, Hook, HookExecution,
    HookExecutionStatus, HookId, HookKind, PrInfo, Task, TaskId,
};

use crate::error::StoreError;
use crate::hook_execution_log::{HookExecutionLog, QueueSnapshot};
use crate::repository::{BoardRepository, ColumnHookAttachment, ColumnHookRepository, ColumnRepository, TaskFieldUpdate, TaskRepository};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| StoreError::Database(e.into()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BoardRow {
    id: String,
    name: String,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: BoardId::from_string(row.id),
            name: row.name,
        }
    }
}

#[derive(FromRow)]
struct ColumnRow {
    id: String,
    board_id: String,
    name: String,
    position: i64,
    hooks_enabled: bool,
    max_concurrent_tasks: Option<i32>,
}

impl From<ColumnRow> for Column {
    fn from(row: ColumnRow) -> Self {
        Column {
            id: ColumnId::from_string(row.id),
            board_id: BoardId::from_string(row.board_id),
            name: row.name,
            position: row.position,
            settings: ColumnSettings {
                hooks_enabled: row.hooks_enabled,
                max_concurrent_tasks: row.max_concurrent_tasks.map(|n| n as u32),
            },
        }
    }
}

#[derive(FromRow)]
struct HookRow {
    id: String,
    board_id: String,
    name: String,
    kind: String,
    command: Option<String>,
    agent_prompt: Option<String>,
    agent_executor: Option<String>,
    default_execute_once: bool,
    default_transparent: bool,
}

impl From<HookRow> for Hook {
    fn from(row: HookRow) -> Self {
        let kind = match row.kind.as_str() {
            "agent" => HookKind::Agent,
            "system" => HookKind::System,
            _ => HookKind::Script,
        };
        Hook {
            id: HookId::from_string(row.id),
            board_id: BoardId::from_string(row.board_id),
            name: row.name,
            kind,
            command: row.command,
            agent_prompt: row.agent_prompt,
            agent_executor: row.agent_executor,
            default_execute_once: row.default_execute_once,
            default_transparent: row.default_transparent,
        }
    }
}

#[derive(FromRow)]
struct ColumnHookRow {
    id: String,
    column_id: String,
    hook_id: String,
    position: i64,
    execute_once: bool,
    transparent: bool,
    removable: bool,
    hook_settings: sqlx::types::Json<Map<String, Value>>,
}

impl From<ColumnHookRow> for ColumnHook {
    fn from(row: ColumnHookRow) -> Self {
        ColumnHook {
            id: ColumnHookId::from_string(row.id),
            column_id: ColumnId::from_string(row.column_id),
            hook_id: HookId::from_string(row.hook_id),
            position: row.position,
            execute_once: row.execute_once,
            transparent: row.transparent,
            removable: row.removable,
            hook_settings: row.hook_settings.0,
        }
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: String,
    column_id: String,
    title: String,
    description: String,
    agent_status: String,
    agent_status_message: String,
    in_progress: bool,
    error_message: Option<String>,
    worktree_path: Option<String>,
    worktree_branch: Option<String>,
    custom_branch_name: Option<String>,
    executed_hooks: sqlx::types::Json<Vec<String>>,
    message_queue: sqlx::types::Json<Vec<String>>,
    pr_url: Option<String>,
    pr_number: Option<i64>,
    pr_status: Option<String>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let agent_status = match row.agent_status.as_str() {
            "thinking" => AgentStatus::Thinking,
            "executing" => AgentStatus::Executing,
            "error" => AgentStatus::Error,
            "waiting_for_user" => AgentStatus::WaitingForUser,
            _ => AgentStatus::Idle,
        };
        Task {
            id: TaskId::from_string(row.id),
            column_id: ColumnId::from_string(row.column_id),
            title: row.title,
            description: row.description,
            agent_status,
            agent_status_message: row.agent_status_message,
            in_progress: row.in_progress,
            error_message: row.error_message,
            worktree_path: row.worktree_path,
            worktree_branch: row.worktree_branch,
            custom_branch_name: row.custom_branch_name,
            executed_hooks: row
                .executed_hooks
                .0
                .into_iter()
                .map(ColumnHookId::from_string)
                .collect::<HashSet<_>>(),
            message_queue: row.message_queue.0,
            pr: PrInfo {
                pr_url: row.pr_url,
                pr_number: row.pr_number,
                pr_status: row.pr_status,
            },
        }
    }
}

#[derive(FromRow)]
struct HookExecutionRow {
    id: String,
    task_id: String,
    column_hook_id: Option<String>,
    hook_id: String,
    hook_name: String,
    triggering_column_id: String,
    status: String,
    skip_reason: Option<String>,
    error_message: Option<String>,
    hook_settings: sqlx::types::Json<Map<String, Value>>,
    queued_at: chrono::DateTime<chrono::Utc>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<HookExecutionRow> for HookExecution {
    fn from(row: HookExecutionRow) -> Self {
        let status = match row.status.as_str() {
            "running" => HookExecutionStatus::Running,
            "completed" => HookExecutionStatus::Completed,
            "failed" => HookExecutionStatus::Failed,
            "cancelled" => HookExecutionStatus::Cancelled,
            "skipped" => HookExecutionStatus::Skipped,
            _ => HookExecutionStatus::Pending,
        };
        HookExecution {
            id: viban_core::ExecutionId::from_string(row.id),
            task_id: TaskId::from_string(row.task_id),
            column_hook_id: row.column_hook_id.map(ColumnHookId::from_string),
            hook_id: HookId::from_string(row.hook_id),
            hook_name: row.hook_name,
            triggering_column_id: ColumnId::from_string(row.triggering_column_id),
            status,
            skip_reason: row.skip_reason,
            error_message: row.error_message,
            hook_settings: row.hook_settings.0,
            queued_at: row.queued_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

#[async_trait]
impl BoardRepository for PgStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        let rows: Vec<BoardRow> = sqlx::query_as("SELECT id, name FROM boards ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Board::from).collect())
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>, StoreError> {
        let row: Option<BoardRow> = sqlx::query_as("SELECT id, name FROM boards WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Board::from))
    }
}

#[async_trait]
impl ColumnRepository for PgStore {
    async fn get_column(&self, id: ColumnId) -> Result<Option<Column>, StoreError> {
        let row: Option<ColumnRow> = sqlx::query_as(
            "SELECT id, board_id, name, position, hooks_enabled, max_concurrent_tasks
             FROM columns WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Column::from))
    }

    async fn list_columns_for_board(&self, board_id: BoardId) -> Result<Vec<Column>, StoreError> {
        let rows: Vec<ColumnRow> = sqlx::query_as(
            "SELECT id, board_id, name, position, hooks_enabled, max_concurrent_tasks
             FROM columns WHERE board_id = $1 ORDER BY position ASC",
        )
        .bind(board_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Column::from).collect())
    }
}

#[async_trait]
impl ColumnHookRepository for PgStore {
    async fn list_column_hooks_for_column(
        &self,
        column_id: ColumnId,
    ) -> Result<Vec<ColumnHookAttachment>, StoreError> {
        let column_hooks: Vec<ColumnHookRow> = sqlx::query_as(
            "SELECT id, column_id, hook_id, position, execute_once, transparent, removable, hook_settings
             FROM column_hooks WHERE column_id = $1 ORDER BY position ASC",
        )
        .bind(column_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut attachments = Vec::with_capacity(column_hooks.len());
        for row in column_hooks {
            let column_hook: ColumnHook = row.into();
            if let Some(hook) = self.get_hook(column_hook.hook_id).await? {
                attachments.push(ColumnHookAttachment { column_hook, hook });
            }
        }
        Ok(attachments)
    }

    async fn get_hook(&self, id: HookId) -> Result<Option<Hook>, StoreError> {
        let row: Option<HookRow> = sqlx::query_as(
            "SELECT id, board_id, name, kind, command, agent_prompt, agent_executor,
                    default_execute_once, default_transparent
             FROM hooks WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Hook::from))
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, column_id, title, description, agent_status, agent_status_message,
                    in_progress, error_message, worktree_path, worktree_branch, custom_branch_name,
                    executed_hooks, message_queue, pr_url, pr_number, pr_status
             FROM tasks WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Task::from))
    }

    async fn list_tasks_by_columns(&self, column_ids: &[ColumnId]) -> Result<Vec<Task>, StoreError> {
        if column_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<&str> = column_ids.iter().map(|c| c.as_str()).collect();
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, column_id, title, description, agent_status, agent_status_message,
                    in_progress, error_message, worktree_path, worktree_branch, custom_branch_name,
                    executed_hooks, message_queue, pr_url, pr_number, pr_status
             FROM tasks WHERE column_id = ANY($1)",
        )
        .bind(&ids as &[&str])
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task(&self, id: TaskId, update: TaskFieldUpdate) -> Result<Task, StoreError> {
        let mut task = self
            .get_task(id)
            .await?
            .ok_or_else(|| StoreError::NotFound("task", id.to_string()))?;
        update.apply(&mut task);

        let executed_hooks: Vec<String> = task.executed_hooks.iter().map(|h| h.to_string()).collect();
        sqlx::query(
            "UPDATE tasks SET
                agent_status = $2, agent_status_message = $3, in_progress = $4,
                error_message = $5, worktree_path = $6, worktree_branch = $7,
                column_id = $8, executed_hooks = $9
             WHERE id = $1",
        )
        .bind(task.id.as_str())
        .bind(task.agent_status.to_string())
        .bind(&task.agent_status_message)
        .bind(task.in_progress)
        .bind(&task.error_message)
        .bind(&task.worktree_path)
        .bind(&task.worktree_branch)
        .bind(task.column_id.as_str())
        .bind(sqlx::types::Json(executed_hooks))
        .execute(&self.pool)
        .await?;

        Ok(task)
    }
}

#[async_trait]
impl HookExecutionLog for PgStore {
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
            chrono::Utc::now(),
        );
        sqlx::query(
            "INSERT INTO hook_executions
                (id, task_id, column_hook_id, hook_id, hook_name, triggering_column_id,
                 status, hook_settings, queued_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(row.id.as_str())
        .bind(row.task_id.as_str())
        .bind(row.column_hook_id.as_ref().map(|c| c.as_str()))
        .bind(row.hook_id.as_str())
        .bind(&row.hook_name)
        .bind(row.triggering_column_id.as_str())
        .bind(row.status.to_string())
        .bind(sqlx::types::Json(&row.hook_settings))
        .bind(row.queued_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    async fn start(&self, id: &str) -> Result<HookExecution, StoreError> {
        self.transition(id, "running", None, true).await
    }

    async fn complete(&self, id: &str) -> Result<HookExecution, StoreError> {
        self.transition(id, "completed", None, false).await
    }

    async fn fail(&self, id: &str, error_message: &str) -> Result<HookExecution, StoreError> {
        self.transition(id, "failed", Some(error_message), false).await
    }

    async fn cancel(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError> {
        self.transition_with_reason(id, "cancelled", reason).await
    }

    async fn skip(&self, id: &str, reason: &str) -> Result<HookExecution, StoreError> {
        self.transition_with_reason(id, "skipped", reason).await
    }

    async fn pending_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        self.executions_where("status = 'pending' AND task_id = $1", task_id).await
    }

    async fn active_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        self.executions_where("status IN ('pending', 'running') AND task_id = $1", task_id).await
    }

    async fn history_for_task(&self, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        self.executions_where("task_id = $1 ORDER BY queued_at ASC", task_id).await
    }

    async fn active_for_task_and_column(
        &self,
        task_id: TaskId,
        column_id: ColumnId,
    ) -> Result<Vec<HookExecution>, StoreError> {
        let rows: Vec<HookExecutionRow> = sqlx::query_as(
            "SELECT id, task_id, column_hook_id, hook_id, hook_name, triggering_column_id,
                    status, skip_reason, error_message, hook_settings, queued_at, started_at, completed_at
             FROM hook_executions
             WHERE task_id = $1 AND triggering_column_id = $2 AND status IN ('pending', 'running')",
        )
        .bind(task_id.as_str())
        .bind(column_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HookExecution::from).collect())
    }

    async fn set_queue_snapshot(&self, task_id: TaskId, snapshot: QueueSnapshot) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO task_queue_snapshots (task_id, snapshot)
             VALUES ($1, $2)
             ON CONFLICT (task_id) DO UPDATE SET snapshot = EXCLUDED.snapshot",
        )
        .bind(task_id.as_str())
        .bind(sqlx::types::Json(snapshot))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_queue_snapshot(&self, task_id: TaskId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM task_queue_snapshots WHERE task_id = $1")
            .bind(task_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_queue_snapshot(&self, task_id: TaskId) -> Result<Option<QueueSnapshot>, StoreError> {
        let row: Option<(sqlx::types::Json<QueueSnapshot>,)> =
            sqlx::query_as("SELECT snapshot FROM task_queue_snapshots WHERE task_id = $1")
                .bind(task_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(json,)| json.0))
    }
}

impl PgStore {
    async fn transition(
        &self,
        id: &str,
        status: &str,
        error_message: Option<&str>,
        is_start: bool,
    ) -> Result<HookExecution, StoreError> {
        let now = chrono::Utc::now();
        if is_start {
            sqlx::query("UPDATE hook_executions SET status = $2, started_at = $3 WHERE id = $1")
                .bind(id)
                .bind(status)
                .bind(now)
                .execute(&self.pool)
                .await?;
        } else {
            sqlx::query(
                "UPDATE hook_executions SET status = $2, error_message = $3, completed_at = $4 WHERE id = $1",
            )
            .bind(id)
            .bind(status)
            .bind(error_message)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }
        self.get_execution(id).await
    }

    async fn transition_with_reason(&self, id: &str, status: &str, reason: &str) -> Result<HookExecution, StoreError> {
        sqlx::query("UPDATE hook_executions SET status = $2, skip_reason = $3, completed_at = $4 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(reason)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;
        self.get_execution(id).await
    }

    async fn get_execution(&self, id: &str) -> Result<HookExecution, StoreError> {
        let row: Option<HookExecutionRow> = sqlx::query_as(
            "SELECT id, task_id, column_hook_id, hook_id, hook_name, triggering_column_id,
                    status, skip_reason, error_message, hook_settings, queued_at, started_at, completed_at
             FROM hook_executions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(HookExecution::from)
            .ok_or_else(|| StoreError::ExecutionNotFound(id.to_string()))
    }

    async fn executions_where(&self, clause: &str, task_id: TaskId) -> Result<Vec<HookExecution>, StoreError> {
        let sql = format!(
            "SELECT id, task_id, column_hook_id, hook_id, hook_name, triggering_column_id,
                    status, skip_reason, error_message, hook_settings, queued_at, started_at, completed_at
             FROM hook_executions WHERE {clause}"
        );
        let rows: Vec<HookExecutionRow> = sqlx::query_as(&sql).bind(task_id.as_str()).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(HookExecution::from).collect())
    }
}
