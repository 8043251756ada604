// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core event types and the topic names they publish under.
//!
//! Topics are colon-namespaced strings, following `oj-daemon`'s
//! `#[serde(rename = "agent:working")]` convention for wire-level event
//! names. Static topics are constants; per-entity topics are built with the
//! `*_topic` functions below so callers never hand-assemble the format.

use serde::{Deserialize, Serialize};

use crate::hook_execution::HookExecutionStatus;
use crate::id::{BoardId, ColumnId, HookId, TaskId};
use crate::task::Task;

/// Task lifecycle notifications from the data layer. Subscribed to by every
/// `BoardActor`.
pub const TASK_UPDATES_TOPIC: &str = "task:updates";

pub fn task_execute_topic(task_id: &TaskId) -> String {
    format!("task:{task_id}:execute")
}

pub fn executor_completed_topic(task_id: &TaskId) -> String {
    format!("executor:{task_id}:completed")
}

pub fn board_topic(board_id: &BoardId) -> String {
    format!("kanban_lite:board:{board_id}")
}

/// Task lifecycle event published on [`TASK_UPDATES_TOPIC`] by the data-layer
/// notifier (see spec §6 "Notifier interface").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskLifecycleEvent {
    #[serde(rename = "task:created")]
    TaskCreated { task: Task },
    #[serde(rename = "task:updated")]
    TaskUpdated { task: Task },
    #[serde(rename = "task:deleted")]
    TaskDeleted { task_id: TaskId },
    #[serde(rename = "board:created")]
    BoardCreated { board_id: BoardId },
    #[serde(rename = "board:deleted")]
    BoardDeleted { board_id: BoardId },
}

/// Wake signal published on `task:<id>:execute` by the ColumnSemaphore when a
/// waiting task is granted a slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskExecuteSignal {
    pub task_id: TaskId,
}

/// Exit status published on `executor:<id>:completed` by a backgrounded
/// executor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutorCompleted {
    pub task_id: TaskId,
    pub exit_code: i32,
}

/// Side effects attached to a [`HookExecutedNotification`], e.g. a system
/// `play-sound` hook telling UI clients which sound to play.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEffects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_sound: Option<PlaySoundEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaySoundEffect {
    pub sound: String,
}

/// Wire format published on `kanban_lite:board:<board_id>` for UI clients,
/// exactly matching the shape in spec §6 ("Event wire format").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookExecutedNotification {
    pub hook_id: HookId,
    pub hook_name: String,
    pub task_id: TaskId,
    pub triggering_column_id: ColumnId,
    pub result: HookExecutedResult,
    #[serde(default)]
    pub effects: HookEffects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookExecutedResult {
    Ok,
    Error,
}

impl HookExecutedResult {
    pub fn from_status(status: HookExecutionStatus) -> Self {
        match status {
            HookExecutionStatus::Completed | HookExecutionStatus::Skipped => Self::Ok,
            _ => Self::Error,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;