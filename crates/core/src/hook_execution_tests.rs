// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::id::{ColumnHookId, ColumnId, HookId, TaskId};
use chrono::Utc;

fn new_row() -> HookExecution {
    HookExecution::new(
        TaskId::new(),
        Some(ColumnHookId::new()),
        HookId::new(),
        "lint",
        ColumnId::new(),
        Map::new(),
        Utc::now(),
    )
}

#[test]
fn starts_pending() {
    let row = new_row();
    assert_eq!(row.status, HookExecutionStatus::Pending);
    assert!(row.status.is_active());
    assert!(row.started_at.is_none());
}

#[test]
fn completing_sets_terminal_and_timestamp() {
    let mut row = new_row();
    let at = Utc::now();
    row.start(at);
    row.complete(at);
    assert_eq!(row.status, HookExecutionStatus::Completed);
    assert!(row.status.is_terminal());
    assert_eq!(row.completed_at, Some(at));
}

#[test]
fn cancel_records_reason() {
    let mut row = new_row();
    let at = Utc::now();
    row.cancel(skip_reason::COLUMN_CHANGE, at);
    assert_eq!(row.status, HookExecutionStatus::Cancelled);
    assert_eq!(row.skip_reason.as_deref(), Some("column_change"));
}

#[test]
fn skip_records_reason_and_is_terminal() {
    let mut row = new_row();
    row.skip(skip_reason::DISABLED, Utc::now());
    assert!(row.status.is_terminal());
    assert_eq!(row.skip_reason.as_deref(), Some("disabled"));
}