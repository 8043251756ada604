// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook: a unit of work that can be attached to columns via [`crate::column_hook::ColumnHook`].

use serde::{Deserialize, Serialize};

use crate::builder;
use crate::id::{BoardId, HookId};
use crate::simple_display;

/// Prefix used for built-in system hook ids (`system:execute-ai`, etc.); these
/// are not rows in the data layer but entries in a process-wide registry.
pub const SYSTEM_HOOK_PREFIX: &str = "system:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    Script,
    Agent,
    System,
}

simple_display! {
    HookKind {
        Script => "script",
        Agent => "agent",
        System => "system",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub id: HookId,
    pub board_id: BoardId,
    pub name: String,
    pub kind: HookKind,
    /// Shell command or script body; set when `kind == Script`.
    pub command: Option<String>,
    /// Prompt template; set when `kind == Agent`.
    pub agent_prompt: Option<String>,
    /// Named executor to run the prompt through; set when `kind == Agent`.
    pub agent_executor: Option<String>,
    pub default_execute_once: bool,
    pub default_transparent: bool,
}

impl Hook {
    /// Whether `id` addresses a built-in system hook (`system:<slug>`) rather
    /// than a data-layer row.
    pub fn is_system_id(id: &str) -> bool {
        id.starts_with(SYSTEM_HOOK_PREFIX)
    }
}

builder! {
    pub struct HookBuilder => Hook {
        into {
            name: String = "hook",
        }
        set {
            id: HookId = HookId::new(),
            board_id: BoardId = BoardId::new(),
            kind: HookKind = HookKind::Script,
            default_execute_once: bool = false,
            default_transparent: bool = false,
        }
        option {
            command: String = None,
            agent_prompt: String = None,
            agent_executor: String = None,
        }
    }
}