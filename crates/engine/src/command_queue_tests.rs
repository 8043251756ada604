// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use viban_core::{ColumnHook, ColumnId, Hook};

fn hook_entry_command() -> Command {
    Command::hook_entry(ColumnHook::builder().build(), Hook::builder().build())
}

#[test]
fn pop_is_atomic_with_current() {
    let mut q = CommandQueue::new();
    q.push(Command::move_task(ColumnId::new()));
    assert!(q.current().is_none());
    assert!(q.pop().is_some());
    assert!(q.current().is_some());
    // Another pop while one is current does nothing.
    assert!(q.pop().is_none());
}

#[test]
fn fifo_order_is_preserved() {
    let mut q = CommandQueue::new();
    let a = ColumnId::new();
    let b = ColumnId::new();
    q.push(Command::move_task(a));
    q.push(Command::move_task(b));
    q.pop();
    let popped_first = match q.current().unwrap().kind {
        CommandKind::MoveTask { target_column_id } => target_column_id,
        _ => unreachable!(),
    };
    assert_eq!(popped_first, a);
}

#[test]
fn clear_only_drops_pending_not_current() {
    let mut q = CommandQueue::new();
    q.push(hook_entry_command());
    q.pop();
    q.push(Command::move_task(ColumnId::new()));
    q.clear();
    assert!(q.current().is_some());
    assert_eq!(q.length(), 1);
}

#[test]
fn complete_current_clears_slot() {
    let mut q = CommandQueue::new();
    q.push(Command::move_task(ColumnId::new()));
    q.pop();
    assert!(q.complete_current().is_some());
    assert!(q.current().is_none());
    assert!(q.is_idle());
}

#[test]
fn remove_type_filters_pending_only() {
    let mut q = CommandQueue::new();
    let col = ColumnId::new();
    q.push(Command::notify_semaphore_leave(col));
    q.push(Command::move_task(col));
    q.remove_type(|k| matches!(k, CommandKind::NotifySemaphoreLeave { .. }));
    assert_eq!(q.length(), 1);
}

#[test]
fn interrupt_flag_round_trips_once() {
    let mut q = CommandQueue::new();
    assert!(!q.take_interrupted());
    q.interrupt();
    assert!(q.take_interrupted());
    assert!(!q.take_interrupted());
}
