// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error type for `viban-core` itself.
//!
//! The domain error kinds spec §7 enumerates (`worktree_missing`,
//! `exit_code`, `timeout`, `task_not_found`, `executor_failed`,
//! `unknown_hook`) belong to the crates that actually raise them
//! (`viban-engine`, `viban-store`) — this crate only needs an error type for
//! its own id/data-model operations, following `oj-daemon`'s one-error-enum-
//! per-crate convention (`ContainerError` in `services::container`,
//! `ExecuteError` in the executors crate).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}