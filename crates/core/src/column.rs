// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Column: an ordered slot within a board that tasks live in.

use serde::{Deserialize, Serialize};

use crate::builder;
use crate::id::{BoardId, ColumnId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSettings {
    pub hooks_enabled: bool,
    /// `None` means uncapped: [`crate::column::ColumnSettings`] admits any
    /// number of concurrently running tasks.
    pub max_concurrent_tasks: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    /// Ascending order of columns within `board_id`; a total order.
    pub position: i64,
    pub settings: ColumnSettings,
}

builder! {
    pub struct ColumnBuilder => Column {
        into {
            name: String = "column",
        }
        set {
            id: ColumnId = ColumnId::new(),
            board_id: BoardId = BoardId::new(),
            position: i64 = 0,
            settings: ColumnSettings = ColumnSettings::default(),
        }
    }
}