// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HookExecution: the append-mostly log row tracking one hook run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{ColumnHookId, ColumnId, ExecutionId, HookId, TaskId};
use crate::simple_display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Skipped,
}

simple_display! {
    HookExecutionStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Skipped => "skipped",
    }
}

impl HookExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Skipped
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

/// Why a row transitioned to `skipped` or `cancelled`. Carried as a string on
/// the row (`skip_reason`) rather than a closed enum because `oj-daemon`'s
/// equivalent (`DecisionSource`) leaves room for new reasons without a schema
/// migration; these four are the ones named by spec.md.
pub mod skip_reason {
    pub const DISABLED: &str = "disabled";
    pub const ERROR: &str = "error";
    pub const COLUMN_CHANGE: &str = "column_change";
    pub const UNKNOWN_HOOK: &str = "unknown_hook";
    pub const WORKTREE_MISSING: &str = "worktree_missing";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookExecution {
    pub id: ExecutionId,
    pub task_id: TaskId,
    /// Absent for hooks invoked outside a ColumnHook attachment (none exist
    /// yet in this spec, but the row shape allows it per §3).
    pub column_hook_id: Option<ColumnHookId>,
    pub hook_id: HookId,
    pub hook_name: String,
    pub triggering_column_id: ColumnId,
    pub status: HookExecutionStatus,
    pub skip_reason: Option<String>,
    pub error_message: Option<String>,
    pub hook_settings: Map<String, Value>,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl HookExecution {
    pub fn new(
        task_id: TaskId,
        column_hook_id: Option<ColumnHookId>,
        hook_id: HookId,
        hook_name: impl Into<String>,
        triggering_column_id: ColumnId,
        hook_settings: Map<String, Value>,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            task_id,
            column_hook_id,
            hook_id,
            hook_name: hook_name.into(),
            triggering_column_id,
            status: HookExecutionStatus::Pending,
            skip_reason: None,
            error_message: None,
            hook_settings,
            queued_at,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self, at: DateTime<Utc>) {
        self.status = HookExecutionStatus::Running;
        self.started_at = Some(at);
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = HookExecutionStatus::Completed;
        self.completed_at = Some(at);
    }

    pub fn fail(&mut self, error_message: impl Into<String>, at: DateTime<Utc>) {
        self.status = HookExecutionStatus::Failed;
        self.error_message = Some(error_message.into());
        self.completed_at = Some(at);
    }

    pub fn cancel(&mut self, reason: &str, at: DateTime<Utc>) {
        self.status = HookExecutionStatus::Cancelled;
        self.skip_reason = Some(reason.to_string());
        self.completed_at = Some(at);
    }

    pub fn skip(&mut self, reason: &str, at: DateTime<Utc>) {
        self.status = HookExecutionStatus::Skipped;
        self.skip_reason = Some(reason.to_string());
        self.completed_at = Some(at);
    }
}

#[cfg(test)]
#[path = "hook_execution_tests.rs"]
mod tests;