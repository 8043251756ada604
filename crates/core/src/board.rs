// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Board: the top-level container owning columns and hooks.

use serde::{Deserialize, Serialize};

use crate::id::BoardId;
use crate::{builder, setters};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
}

builder! {
    pub struct BoardBuilder => Board {
        into {
            name: String = "board",
        }
        set {
            id: BoardId = BoardId::new(),
        }
    }
}

setters! {
    impl Board {
        into {
            name: String,
        }
    }
}