// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ColumnHook: the ordered attachment of a [`crate::hook::Hook`] to a [`crate::column::Column`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builder;
use crate::id::{ColumnHookId, ColumnId, HookId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnHook {
    pub id: ColumnHookId,
    pub column_id: ColumnId,
    pub hook_id: HookId,
    /// Ascending order of execution among hooks attached to the same column.
    pub position: i64,
    pub execute_once: bool,
    pub transparent: bool,
    /// Whether board operators may detach this attachment (some system hooks
    /// are pinned to a column and cannot be removed).
    pub removable: bool,
    pub hook_settings: Map<String, Value>,
}

builder! {
    pub struct ColumnHookBuilder => ColumnHook {
        set {
            id: ColumnHookId = ColumnHookId::new(),
            column_id: ColumnId = ColumnId::new(),
            hook_id: HookId = HookId::new(),
            position: i64 = 0,
            execute_once: bool = false,
            transparent: bool = false,
            removable: bool = true,
            hook_settings: Map<String, Value> = Map::new(),
        }
    }
}