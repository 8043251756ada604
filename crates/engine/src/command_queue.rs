// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO command queue driven by [`crate::task_actor`] — no I/O happens here.

use std::collections::VecDeque;

use viban_core::{ColumnHook, ColumnId, Hook};

/// One unit of work for a TaskActor, per spec §4.1.
#[derive(Clone)]
pub enum CommandKind {
    HookEntry {
        column_hook: ColumnHook,
        hook: Hook,
    },
    MoveTask {
        target_column_id: ColumnId,
    },
    NotifySemaphoreLeave {
        column_id: ColumnId,
    },
}

pub struct Command {
    pub kind: CommandKind,
}

impl Command {
    pub fn hook_entry(column_hook: ColumnHook, hook: Hook) -> Self {
        Self {
            kind: CommandKind::HookEntry { column_hook, hook },
        }
    }

    pub fn move_task(target_column_id: ColumnId) -> Self {
        Self {
            kind: CommandKind::MoveTask { target_column_id },
        }
    }

    pub fn notify_semaphore_leave(column_id: ColumnId) -> Self {
        Self {
            kind: CommandKind::NotifySemaphoreLeave { column_id },
        }
    }

    /// Coarse label used in `tracing` fields; avoids formatting the full
    /// command (which may carry a multi-KB hook command string) on every log
    /// line.
    pub fn kind_label(&self) -> &'static str {
        match &self.kind {
            CommandKind::HookEntry { .. } => "hook_entry",
            CommandKind::MoveTask { .. } => "move_task",
            CommandKind::NotifySemaphoreLeave { .. } => "notify_semaphore_leave",
        }
    }
}

/// A FIFO of pending [`Command`]s plus a single `current` slot and an
/// `interrupted` flag, exactly as spec §4.1 describes. Performs no I/O: the
/// actor pops a command, runs it elsewhere, and calls back in via
/// [`CommandQueue::complete_current`].
#[derive(Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
    current: Option<Command>,
    interrupted: bool,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    pub fn push_front(&mut self, command: Command) {
        self.pending.push_front(command);
    }

    pub fn push_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Atomically move the next pending command into `current` and return a
    /// reference to it. Returns `None` (leaving `current` untouched) if a
    /// command is already current or nothing is pending.
    pub fn pop(&mut self) -> Option<&Command> {
        if self.current.is_some() {
            return None;
        }
        self.current = self.pending.pop_front();
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    /// A cheap clone of the in-flight command's kind, so callers can match on
    /// it and run async work without holding a borrow of the queue.
    pub fn current_kind(&self) -> Option<CommandKind> {
        self.current.as_ref().map(|c| c.kind.clone())
    }

    /// Clear `current` and return it. The caller (the TaskActor's drain
    /// loop) pushes whatever follow-up commands the completed command
    /// implies directly, rather than through a callback on the command
    /// itself.
    pub fn complete_current(&mut self) -> Option<Command> {
        self.current.take()
    }

    /// Drop every pending command; the in-flight `current` command, if any,
    /// is left alone and will still run to completion.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn take_interrupted(&mut self) -> bool {
        std::mem::take(&mut self.interrupted)
    }

    /// Remove every pending command whose kind matches `predicate`. Used to
    /// drop stale `notify_semaphore_leave` entries, for example.
    pub fn remove_type(&mut self, mut predicate: impl FnMut(&CommandKind) -> bool) {
        self.pending.retain(|c| !predicate(&c.kind));
    }

    pub fn length(&self) -> usize {
        self.pending.len() + self.current.is_some() as usize
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "command_queue_tests.rs"]
mod tests;
