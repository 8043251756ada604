// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Get-or-create map from column id to its [`ColumnSemaphore`] (spec §5:
//! "ColumnSemaphore state is owned by one process per column, or a single
//! semaphore actor keyed by column id" — here, one shared instance per key).

use std::sync::Arc;

use dashmap::DashMap;
use viban_core::ColumnId;
use viban_engine::ColumnSemaphore;

#[derive(Default)]
pub struct ColumnSemaphoreRegistry {
    semaphores: DashMap<ColumnId, Arc<ColumnSemaphore>>,
}

impl ColumnSemaphoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column's semaphore, creating it with `max_concurrent_tasks`
    /// if this is the first lookup. The capacity of an already-created
    /// semaphore is not retroactively changed by a later call with a
    /// different value — callers that need to resize must go through
    /// [`ColumnSemaphoreRegistry::reset`].
    pub fn get_or_create(&self, column_id: ColumnId, max_concurrent_tasks: Option<u32>) -> Arc<ColumnSemaphore> {
        self.semaphores
            .entry(column_id)
            .or_insert_with(|| Arc::new(ColumnSemaphore::new(max_concurrent_tasks)))
            .clone()
    }

    /// Replaces a column's semaphore outright (e.g. after its
    /// `max_concurrent_tasks` setting changes). Existing holders of the old
    /// `Arc` keep it until they drop it; new lookups get the fresh instance.
    pub fn reset(&self, column_id: ColumnId, max_concurrent_tasks: Option<u32>) {
        self.semaphores
            .insert(column_id, Arc::new(ColumnSemaphore::new(max_concurrent_tasks)));
    }

    pub fn remove(&self, column_id: ColumnId) {
        self.semaphores.remove(&column_id);
    }
}

#[cfg(test)]
#[path = "semaphore_registry_tests.rs"]
mod tests;
