// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BoardActor (C6): caches one board's column membership, subscribes to
//! `task:updates`, and keeps a TaskActor running for every task currently
//! sitting in one of those columns.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::warn;
use viban_core::event::{TaskLifecycleEvent, TASK_UPDATES_TOPIC};
use viban_core::{BoardId, ColumnId, Task, TaskId};
use viban_engine::AgentAdapter;
use viban_store::DataLayer;

use crate::event_bus::{BusMessage, EventBus};
use crate::registry::{Registry, RegistryKey};
use crate::task_actor::{TaskActor, TaskActorDeps, TaskActorHandle};

/// Collaborators a BoardActor needs beyond what it hands down to its
/// TaskActors. `task_registry` is scoped to one board: a BoardSupervisor
/// hands in a fresh instance on every restart so a crash drops every stale
/// handle it held (spec §4.7's "task_pids map is lost and must be rebuilt").
pub struct BoardActorDeps<A: AgentAdapter> {
    pub data: Arc<dyn DataLayer>,
    pub bus: Arc<EventBus>,
    pub task_registry: Arc<Registry<TaskActorHandle>>,
    pub task_actor_deps: TaskActorDeps<A>,
}

impl<A: AgentAdapter> Clone for BoardActorDeps<A> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            bus: self.bus.clone(),
            task_registry: self.task_registry.clone(),
            task_actor_deps: self.task_actor_deps.clone(),
        }
    }
}

pub enum BoardActorMessage {
    RefreshColumns,
    Shutdown,
}

#[derive(Clone)]
pub struct BoardActorHandle {
    board_id: BoardId,
    sender: mpsc::Sender<BoardActorMessage>,
}

impl BoardActorHandle {
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    pub async fn refresh_columns(&self) {
        let _ = self.sender.send(BoardActorMessage::RefreshColumns).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(BoardActorMessage::Shutdown).await;
    }
}

/// Owns one board's column cache and task-to-actor mapping (spec §4.6's
/// `task_pids`). At most one instance exists per board id at a time — the
/// registry's `insert_if_absent` on the enclosing BoardSupervisor/BoardManager
/// layer is what actually enforces that.
pub struct BoardActor<A: AgentAdapter> {
    board_id: BoardId,
    column_ids: HashSet<ColumnId>,
    task_handles: HashMap<TaskId, TaskActorHandle>,
    mailbox: mpsc::Receiver<BoardActorMessage>,
    bus_rx: broadcast::Receiver<BusMessage>,
    deps: BoardActorDeps<A>,
}

impl<A: AgentAdapter + 'static> BoardActor<A> {
    /// Spawns the actor, discarding the join handle. Fine for callers that
    /// don't need crash detection (tests, a BoardManager not wrapping boards
    /// in a BoardSupervisor). [`BoardActor::spawn_supervised`] is the variant
    /// a BoardSupervisor uses to monitor for crashes.
    pub fn spawn(board_id: BoardId, deps: BoardActorDeps<A>) -> BoardActorHandle {
        Self::spawn_supervised(board_id, deps).0
    }

    pub fn spawn_supervised(board_id: BoardId, deps: BoardActorDeps<A>) -> (BoardActorHandle, JoinHandle<()>) {
        let (sender, mailbox) = mpsc::channel(64);
        let bus_rx = deps.bus.subscribe(TASK_UPDATES_TOPIC);

        let actor = BoardActor {
            board_id,
            column_ids: HashSet::new(),
            task_handles: HashMap::new(),
            mailbox,
            bus_rx,
            deps,
        };
        let join = tokio::spawn(actor.run());
        (BoardActorHandle { board_id, sender }, join)
    }

    async fn run(mut self) {
        self.refresh_columns().await;
        self.load_existing_tasks().await;

        loop {
            tokio::select! {
                biased;

                maybe_msg = self.mailbox.recv() => {
                    match maybe_msg {
                        None | Some(BoardActorMessage::Shutdown) => break,
                        Some(BoardActorMessage::RefreshColumns) => self.refresh_columns().await,
                    }
                }

                res = self.bus_rx.recv() => {
                    if let Ok(BusMessage::TaskLifecycle(event)) = res {
                        self.handle_event(event).await;
                    }
                }
            }
        }

        self.teardown().await;
    }

    async fn handle_event(&mut self, event: TaskLifecycleEvent) {
        match event {
            TaskLifecycleEvent::TaskCreated { task } | TaskLifecycleEvent::TaskUpdated { task } => {
                if self.column_ids.contains(&task.column_id) {
                    self.ensure_task_actor(task).await;
                } else {
                    self.drop_task_actor(task.id).await;
                }
            }
            TaskLifecycleEvent::TaskDeleted { task_id } => {
                self.drop_task_actor(task_id).await;
            }
            // Board lifecycle is a BoardManager/BoardSupervisor concern; this
            // actor only reacts to the tasks within a board it already owns.
            TaskLifecycleEvent::BoardCreated { .. } | TaskLifecycleEvent::BoardDeleted { .. } => {}
        }
    }

    async fn ensure_task_actor(&mut self, task: Task) {
        let task_id = task.id;
        if let Some(handle) = self.task_handles.get(&task_id) {
            handle.notify_task_updated(task).await;
            return;
        }

        let handle = TaskActor::spawn(self.board_id, task_id, task.column_id, self.deps.task_actor_deps.clone());
        self.deps
            .task_registry
            .insert_if_absent(RegistryKey::TaskActor(task_id), handle.clone());
        self.task_handles.insert(task_id, handle);
    }

    async fn drop_task_actor(&mut self, task_id: TaskId) {
        if let Some(handle) = self.task_handles.remove(&task_id) {
            self.deps.task_registry.remove(&RegistryKey::TaskActor(task_id));
            handle.shutdown().await;
        }
    }

    async fn refresh_columns(&mut self) {
        match self.deps.data.list_columns_for_board(self.board_id).await {
            Ok(columns) => self.column_ids = columns.into_iter().map(|c| c.id).collect(),
            Err(err) => warn!(board = %self.board_id, %err, "failed to refresh column cache"),
        }
    }

    async fn load_existing_tasks(&mut self) {
        let column_ids: Vec<ColumnId> = self.column_ids.iter().copied().collect();
        match self.deps.data.list_tasks_by_columns(&column_ids).await {
            Ok(tasks) => {
                for task in tasks {
                    self.ensure_task_actor(task).await;
                }
            }
            Err(err) => warn!(board = %self.board_id, %err, "failed to load existing tasks on startup"),
        }
    }

    async fn teardown(&mut self) {
        for (task_id, handle) in self.task_handles.drain() {
            self.deps.task_registry.remove(&RegistryKey::TaskActor(task_id));
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
#[path = "board_actor_tests.rs"]
mod tests;
