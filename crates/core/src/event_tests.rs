// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn topics_are_colon_namespaced() {
    let task_id = TaskId::new();
    assert!(task_execute_topic(&task_id).starts_with("task:"));
    assert!(task_execute_topic(&task_id).ends_with(":execute"));
    assert!(executor_completed_topic(&task_id).ends_with(":completed"));
}

#[test]
fn board_topic_matches_wire_prefix() {
    let board_id = BoardId::new();
    assert!(board_topic(&board_id).starts_with("kanban_lite:board:"));
}

#[test]
fn hook_result_ok_for_completed_and_skipped() {
    assert_eq!(
        HookExecutedResult::from_status(HookExecutionStatus::Completed),
        HookExecutedResult::Ok
    );
    assert_eq!(
        HookExecutedResult::from_status(HookExecutionStatus::Skipped),
        HookExecutedResult::Ok
    );
    assert_eq!(
        HookExecutedResult::from_status(HookExecutionStatus::Failed),
        HookExecutedResult::Error
    );
}

#[test]
fn lifecycle_event_serializes_with_tag() {
    let event = TaskLifecycleEvent::TaskDeleted {
        task_id: TaskId::new(),
    };
    let json = serde_json::to_value(&event).expect("serializes");
    assert_eq!(json["type"], "task:deleted");
}