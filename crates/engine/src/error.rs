// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds raised while executing hooks and managing worktrees (spec §7).

use thiserror::Error;

/// Failure modes a [`crate::hook_runner::HookRunner`] or
/// [`crate::worktree_manager::WorktreeManager`] call can surface. These are
/// all recoverable at the task level: a `TaskActor` never crashes on one of
/// these, it folds the error into the task's own error state per §7's
/// propagation policy.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("script exited with code {code}")]
    ExitCode { code: i32, output: String },

    #[error("hook timed out")]
    Timeout,

    #[error("task not found")]
    TaskNotFound,

    #[error("executor failed with exit code {0}")]
    ExecutorFailed(i32),

    #[error("unknown hook id: {0}")]
    UnknownHook(String),

    #[error("system hook failed: {0}")]
    SystemHook(String),

    #[error("git worktree operation failed: {0}")]
    Worktree(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
