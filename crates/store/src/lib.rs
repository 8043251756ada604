// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-layer interface the core consumes (spec §6) plus the hook
//! execution log (C10): a narrow set of repository traits, an in-memory
//! implementation for tests and single-node deployments, and a Postgres
//! implementation for production.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod hook_execution_log;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use error::StoreError;
pub use hook_execution_log::{HookExecutionLog, QueueSnapshot, QueueSnapshotEntry};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    BoardRepository, ColumnHookAttachment, ColumnHookRepository, ColumnRepository, DataLayer, TaskFieldUpdate,
    TaskRepository,
};
