// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BoardSupervisor (C7): one failure domain per board. Restarts the
//! BoardActor (and, with it, its whole TaskActor group) together on any
//! crash, since the two pieces of state only make sense in lockstep — a
//! fresh BoardActor needs its TaskActors respawned, and a surviving
//! TaskActor group with no BoardActor to feed it updates is just as broken.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use viban_core::BoardId;
use viban_engine::AgentAdapter;
use viban_store::DataLayer;

use crate::board_actor::{BoardActor, BoardActorDeps, BoardActorHandle};
use crate::event_bus::EventBus;
use crate::registry::{Registry, RegistryKey};
use crate::task_actor::{TaskActorDeps, TaskActorHandle};

/// Backoff between restart attempts. A board whose actor keeps crashing
/// shouldn't spin the CPU trying to come back up.
const RESTART_BACKOFF: Duration = Duration::from_millis(500);

/// Collaborators shared across every (re)spawn of a board's actor pair.
/// `task_registry` is deliberately excluded here: the supervisor builds a
/// fresh one on every restart so a crash can't leave stale TaskActor handles
/// reachable (see [`BoardSupervisor::run`]).
pub struct BoardSupervisorDeps<A: AgentAdapter> {
    pub data: Arc<dyn DataLayer>,
    pub bus: Arc<EventBus>,
    pub task_actor_deps: TaskActorDeps<A>,
    pub board_registry: Arc<Registry<BoardActorHandle>>,
}

impl<A: AgentAdapter> Clone for BoardSupervisorDeps<A> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            bus: self.bus.clone(),
            task_actor_deps: self.task_actor_deps.clone(),
            board_registry: self.board_registry.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BoardSupervisorHandle {
    board_id: BoardId,
    cancel: CancellationToken,
}

impl BoardSupervisorHandle {
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Stops the current BoardActor (and its TaskActors) and prevents any
    /// further restart.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

pub struct BoardSupervisor<A: AgentAdapter> {
    board_id: BoardId,
    cancel: CancellationToken,
    deps: BoardSupervisorDeps<A>,
}

impl<A: AgentAdapter + 'static> BoardSupervisor<A> {
    pub fn spawn(board_id: BoardId, deps: BoardSupervisorDeps<A>) -> BoardSupervisorHandle {
        let cancel = CancellationToken::new();
        let supervisor = BoardSupervisor {
            board_id,
            cancel: cancel.clone(),
            deps,
        };
        tokio::spawn(supervisor.run());
        BoardSupervisorHandle { board_id, cancel }
    }

    async fn run(self) {
        loop {
            let task_registry = Arc::new(Registry::new());
            let board_deps = BoardActorDeps {
                data: self.deps.data.clone(),
                bus: self.deps.bus.clone(),
                task_registry,
                task_actor_deps: self.deps.task_actor_deps.clone(),
            };
            let (handle, join) = BoardActor::spawn_supervised(self.board_id, board_deps);
            self.deps
                .board_registry
                .insert_if_absent(RegistryKey::BoardActor(self.board_id), handle.clone());

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.deps.board_registry.remove(&RegistryKey::BoardActor(self.board_id));
                    handle.shutdown().await;
                    let _ = join.await;
                    break;
                }
                result = join => {
                    self.deps.board_registry.remove(&RegistryKey::BoardActor(self.board_id));
                    match result {
                        Ok(()) => info!(board = %self.board_id, "board actor exited, restarting"),
                        Err(err) => warn!(board = %self.board_id, %err, "board actor panicked, restarting"),
                    }
                    tokio::time::sleep(RESTART_BACKOFF).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "board_supervisor_tests.rs"]
mod tests;
