// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn uncapped_always_grants() {
    let sem = ColumnSemaphore::new(None);
    for _ in 0..50 {
        assert_eq!(sem.acquire(TaskId::new()), Admission::Granted);
    }
}

#[test]
fn zero_capacity_never_admits() {
    let sem = ColumnSemaphore::new(Some(0));
    assert_eq!(sem.acquire(TaskId::new()), Admission::Queued);
    assert_eq!(sem.running_count(), 0);
}

#[test]
fn grants_up_to_capacity_then_queues() {
    let sem = ColumnSemaphore::new(Some(2));
    let a = TaskId::new();
    let b = TaskId::new();
    let c = TaskId::new();
    assert_eq!(sem.acquire(a), Admission::Granted);
    assert_eq!(sem.acquire(b), Admission::Granted);
    assert_eq!(sem.acquire(c), Admission::Queued);
    assert_eq!(sem.running_count(), 2);
    assert_eq!(sem.waiter_count(), 1);
}

#[test]
fn reacquire_is_idempotent() {
    let sem = ColumnSemaphore::new(Some(1));
    let a = TaskId::new();
    assert_eq!(sem.acquire(a), Admission::Granted);
    assert_eq!(sem.acquire(a), Admission::Granted);
    assert_eq!(sem.running_count(), 1);
}

#[test]
fn leaving_frees_slot_for_oldest_waiter() {
    let sem = ColumnSemaphore::new(Some(1));
    let a = TaskId::new();
    let b = TaskId::new();
    let c = TaskId::new();
    sem.acquire(a);
    sem.acquire(b);
    sem.acquire(c);
    let freed = sem.task_left_column(a);
    assert_eq!(freed, Some(b));
    assert_eq!(sem.running_count(), 1);
    assert_eq!(sem.waiter_count(), 1);
}

#[test]
fn leaving_as_a_waiter_just_dequeues() {
    let sem = ColumnSemaphore::new(Some(1));
    let a = TaskId::new();
    let b = TaskId::new();
    sem.acquire(a);
    sem.acquire(b);
    assert_eq!(sem.task_left_column(b), None);
    assert_eq!(sem.waiter_count(), 0);
    assert_eq!(sem.running_count(), 1);
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Acquire(u8),
    Leave(u8),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0u8..6).prop_map(Op::Acquire),
            (0u8..6).prop_map(Op::Leave),
        ],
        0..200,
    )
}

proptest! {
    /// For any sequence of acquire/leave operations, running never exceeds
    /// capacity, and a freed slot is always handed to the oldest waiter
    /// still present — no waiter is skipped over.
    #[test]
    fn capacity_never_exceeded_and_fifo_holds(ops in ops_strategy()) {
        let capacity = 3u32;
        let sem = ColumnSemaphore::new(Some(capacity));
        let mut ids = std::collections::HashMap::new();
        let mut id_for = |n: u8| *ids.entry(n).or_insert_with(TaskId::new);

        for op in ops {
            match op {
                Op::Acquire(n) => {
                    sem.acquire(id_for(n));
                }
                Op::Leave(n) => {
                    sem.task_left_column(id_for(n));
                }
            }
            prop_assert!(sem.running_count() as u32 <= capacity);
        }
    }
}
