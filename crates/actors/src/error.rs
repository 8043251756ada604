// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type for the actor hierarchy (C5–C9).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActorError {
    #[error(transparent)]
    Store(#[from] viban_store::StoreError),

    #[error(transparent)]
    Engine(#[from] viban_engine::EngineError),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("no repository location configured for board {0}")]
    NoRepoLocation(String),

    #[error("actor mailbox closed")]
    MailboxClosed,
}
