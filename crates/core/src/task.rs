// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task: the unit of work a [`crate::hook::Hook`] pipeline drives through a board.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::{ColumnHookId, ColumnId, TaskId};
use crate::simple_display;
use crate::{builder, setters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Executing,
    Error,
    WaitingForUser,
}

simple_display! {
    AgentStatus {
        Idle => "idle",
        Thinking => "thinking",
        Executing => "executing",
        Error => "error",
        WaitingForUser => "waiting_for_user",
    }
}

/// Pass-through pull-request metadata. The core never opens or updates a PR
/// itself (see SPEC_FULL.md Non-goals); these fields are carried so a task
/// card can display whatever the external PR-creation integration wrote back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrInfo {
    pub pr_url: Option<String>,
    pub pr_number: Option<i64>,
    pub pr_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub agent_status: AgentStatus,
    pub agent_status_message: String,
    pub in_progress: bool,
    pub error_message: Option<String>,
    pub worktree_path: Option<String>,
    pub worktree_branch: Option<String>,
    pub custom_branch_name: Option<String>,
    /// ColumnHook ids for which `execute_once` has already fired for this task.
    pub executed_hooks: HashSet<ColumnHookId>,
    /// User-submitted messages queued while the agent is busy, drained in order.
    pub message_queue: Vec<String>,
    pub pr: PrInfo,
}

impl Task {
    pub fn mark_executed(&mut self, column_hook_id: ColumnHookId) {
        self.executed_hooks.insert(column_hook_id);
    }

    pub fn has_executed(&self, column_hook_id: ColumnHookId) -> bool {
        self.executed_hooks.contains(&column_hook_id)
    }

    pub fn enter_error(&mut self, message: impl Into<String>) {
        self.agent_status = AgentStatus::Error;
        self.error_message = Some(message.into());
        self.in_progress = false;
    }

    pub fn enter_idle(&mut self, message: impl Into<String>) {
        self.agent_status = AgentStatus::Idle;
        self.agent_status_message = message.into();
        self.in_progress = false;
    }
}

builder! {
    pub struct TaskBuilder => Task {
        into {
            title: String = "task",
            description: String = "",
            agent_status_message: String = "",
        }
        set {
            id: TaskId = TaskId::new(),
            column_id: ColumnId = ColumnId::new(),
            agent_status: AgentStatus = AgentStatus::Idle,
            in_progress: bool = false,
            executed_hooks: HashSet<ColumnHookId> = HashSet::new(),
            message_queue: Vec<String> = Vec::new(),
            pr: PrInfo = PrInfo::default(),
        }
        option {
            error_message: String = None,
            worktree_path: String = None,
            worktree_branch: String = None,
            custom_branch_name: String = None,
        }
    }
}

setters! {
    impl Task {
        into {
            agent_status_message: String,
        }
    }
}