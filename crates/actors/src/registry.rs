// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry (C9, name-lookup half): an owned concurrent map from stable,
//! algebraic keys to actor handles, replacing `oj-daemon`'s (and the
//! original Elixir system's) named-process registry. Grounded on
//! Design Notes §9 ("Named process lookup becomes an owned concurrent map
//! `Registry<Key, Handle>`"); backed by `dashmap`, which this workspace
//! already depends on for exactly this.

use dashmap::DashMap;
use viban_core::{BoardId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKey {
    BoardManager,
    BoardSupervisor(BoardId),
    BoardActor(BoardId),
    TaskSupervisor(BoardId),
    TaskActor(TaskId),
}

/// `insert_if_absent`/`remove`/`lookup` exactly as spec Design Notes §9
/// names them. `lookup` returning `None` is the "not_found sentinel" spec
/// §4.9 requires.
pub struct Registry<H: Clone> {
    entries: DashMap<RegistryKey, H>,
}

impl<H: Clone> Default for Registry<H> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<H: Clone> Registry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `handle` under `key` only if nothing is registered there yet.
    /// Returns `true` if the insert happened — the caller-visible half of
    /// `BoardManager.notify_board_created`'s idempotence (spec §8).
    pub fn insert_if_absent(&self, key: RegistryKey, handle: H) -> bool {
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(handle);
                true
            }
        }
    }

    pub fn lookup(&self, key: &RegistryKey) -> Option<H> {
        self.entries.get(key).map(|r| r.value().clone())
    }

    pub fn remove(&self, key: &RegistryKey) -> Option<H> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every registered key. Used by `BoardManager::list_boards`
    /// (spec §4.8) to enumerate the boards it currently supervises without
    /// exposing the backing map.
    pub fn keys(&self) -> Vec<RegistryKey> {
        self.entries.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
