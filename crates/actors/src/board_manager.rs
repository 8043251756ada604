// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BoardManager (C8): the single process-wide entry point that tracks which
//! boards are active and starts/stops a [`BoardSupervisor`] for each one.
//! Unlike `BoardActor`/`TaskActor`, it has no ordering-sensitive inbox of its
//! own — `notify_board_created`/`notify_board_deleted` are idempotent,
//! registry-guarded operations (spec §4.8), so it is a plain shared struct
//! over a `Registry` rather than another mailbox actor, the same choice
//! `ColumnSemaphoreRegistry` makes for its own get-or-create map.

use std::sync::Arc;

use tracing::info;
use viban_core::BoardId;
use viban_engine::AgentAdapter;
use viban_store::DataLayer;

use crate::board_actor::BoardActorHandle;
use crate::board_supervisor::{BoardSupervisor, BoardSupervisorDeps, BoardSupervisorHandle};
use crate::event_bus::EventBus;
use crate::registry::{Registry, RegistryKey};
use crate::task_actor::TaskActorDeps;

/// Collaborators every BoardSupervisor this manager spawns will need.
pub struct BoardManagerDeps<A: AgentAdapter> {
    pub data: Arc<dyn DataLayer>,
    pub bus: Arc<EventBus>,
    pub task_actor_deps: TaskActorDeps<A>,
}

impl<A: AgentAdapter> Clone for BoardManagerDeps<A> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            bus: self.bus.clone(),
            task_actor_deps: self.task_actor_deps.clone(),
        }
    }
}

/// Tracks the set of currently-managed boards. At most one `BoardSupervisor`
/// (and, transitively, one `BoardActor`) exists per board id at a time —
/// spec §8's "`notify_board_created(b)` applied k≥1 times results in exactly
/// one BoardSupervisor".
pub struct BoardManager<A: AgentAdapter> {
    deps: BoardManagerDeps<A>,
    supervisors: Arc<Registry<BoardSupervisorHandle>>,
    /// Shared across every board's supervisor so a `BoardActor` handle is
    /// reachable by board id regardless of which supervisor (re)spawned it.
    board_registry: Arc<Registry<BoardActorHandle>>,
}

impl<A: AgentAdapter + 'static> BoardManager<A> {
    pub fn new(deps: BoardManagerDeps<A>) -> Self {
        Self {
            deps,
            supervisors: Arc::new(Registry::new()),
            board_registry: Arc::new(Registry::new()),
        }
    }

    /// Reads every existing board from the data layer and starts a
    /// supervisor for each (spec §4.8 "On boot it reads all existing boards
    /// and starts a BoardSupervisor for each (idempotent)").
    pub async fn reconcile(&self) -> Result<(), viban_store::StoreError> {
        for board in self.deps.data.list_boards().await? {
            self.notify_board_created(board.id);
        }
        Ok(())
    }

    /// Starts a `BoardSupervisor` for `board_id` if one isn't already
    /// running. Returns `true` if this call was the one that started it.
    ///
    /// Spawn happens before the registry insert, so two concurrent callers
    /// can each spawn a supervisor for the same board; only the winner's
    /// `insert_if_absent` succeeds; the loser immediately shuts its
    /// supervisor down. The window is harmless — a `BoardSupervisor` that
    /// never receives a registry entry on the winning side does no work
    /// beyond caching one empty column set before its `shutdown` takes
    /// effect — and keeps this call lock-free.
    pub fn notify_board_created(&self, board_id: BoardId) -> bool {
        if self.supervisors.lookup(&RegistryKey::BoardSupervisor(board_id)).is_some() {
            return false;
        }

        let supervisor_deps = BoardSupervisorDeps {
            data: self.deps.data.clone(),
            bus: self.deps.bus.clone(),
            task_actor_deps: self.deps.task_actor_deps.clone(),
            board_registry: self.board_registry.clone(),
        };
        let handle = BoardSupervisor::spawn(board_id, supervisor_deps);

        if self
            .supervisors
            .insert_if_absent(RegistryKey::BoardSupervisor(board_id), handle.clone())
        {
            info!(board = %board_id, "board supervisor started");
            true
        } else {
            handle.shutdown();
            false
        }
    }

    /// Stops `board_id`'s supervisor (and, with it, its BoardActor and every
    /// TaskActor in its group). A no-op if the board isn't managed.
    pub fn notify_board_deleted(&self, board_id: BoardId) {
        if let Some(handle) = self.supervisors.remove(&RegistryKey::BoardSupervisor(board_id)) {
            handle.shutdown();
            info!(board = %board_id, "board supervisor stopped");
        }
    }

    /// Stops every supervised board's supervisor. Called on daemon shutdown
    /// (`SIGTERM`/ctrl-c) so in-flight commands get a chance to drain via
    /// each `BoardSupervisor`'s own shutdown path rather than the process
    /// simply vanishing out from under them.
    pub fn shutdown_all(&self) {
        for board_id in self.list_boards() {
            self.notify_board_deleted(board_id);
        }
    }

    /// Board ids this manager currently supervises.
    pub fn list_boards(&self) -> Vec<BoardId> {
        self.supervisors
            .keys()
            .into_iter()
            .filter_map(|key| match key {
                RegistryKey::BoardSupervisor(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "board_manager_tests.rs"]
mod tests;
