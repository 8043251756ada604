// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ColumnSemaphore (C4): per-column admission control with FIFO waiters.
//!
//! One instance is owned per column (spec §5 "Shared resources": "owned by
//! one process per column"). `parking_lot::Mutex` guards the running/waiters
//! state the way `oj-daemon` guards its in-process `MaterializedState`.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use viban_core::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    Queued,
}

struct State {
    running: HashSet<TaskId>,
    waiters: VecDeque<TaskId>,
}

/// Admission control for one column. `max_concurrent_tasks = None` admits
/// unconditionally; `Some(0)` never admits (SPEC_FULL.md Open Question 3 —
/// a resolved ambiguity, not a crash).
pub struct ColumnSemaphore {
    max_concurrent_tasks: Option<u32>,
    state: Mutex<State>,
}

impl ColumnSemaphore {
    pub fn new(max_concurrent_tasks: Option<u32>) -> Self {
        Self {
            max_concurrent_tasks,
            state: Mutex::new(State {
                running: HashSet::new(),
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Grants immediately if under capacity (or uncapped); otherwise queues
    /// `task_id` as a FIFO waiter. Re-acquiring by a task already running or
    /// already waiting is a no-op that returns its existing admission.
    pub fn acquire(&self, task_id: TaskId) -> Admission {
        let mut state = self.state.lock();
        if state.running.contains(&task_id) {
            return Admission::Granted;
        }
        if state.waiters.contains(&task_id) {
            return Admission::Queued;
        }

        let capacity = match self.max_concurrent_tasks {
            None => return Self::grant(&mut state, task_id),
            Some(n) => n,
        };

        if (state.running.len() as u32) < capacity {
            Self::grant(&mut state, task_id)
        } else {
            state.waiters.push_back(task_id);
            Admission::Queued
        }
    }

    fn grant(state: &mut State, task_id: TaskId) -> Admission {
        state.running.insert(task_id);
        Admission::Granted
    }

    /// Removes `task_id` from running or waiters. Returns the next waiter to
    /// admit, if a slot freed up — the caller is responsible for publishing
    /// `task:<id>:execute` for it on the EventBus (this type has no bus
    /// dependency, matching C4's description as pure admission bookkeeping).
    pub fn task_left_column(&self, task_id: TaskId) -> Option<TaskId> {
        let mut state = self.state.lock();
        let was_running = state.running.remove(&task_id);
        if !was_running {
            state.waiters.retain(|t| *t != task_id);
            return None;
        }

        self.max_concurrent_tasks?;
        let next = state.waiters.pop_front()?;
        state.running.insert(next);
        Some(next)
    }

    pub fn running_count(&self) -> usize {
        self.state.lock().running.len()
    }

    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

#[cfg(test)]
#[path = "column_semaphore_tests.rs"]
mod tests;
