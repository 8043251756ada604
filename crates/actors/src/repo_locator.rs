// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves a board's primary repository location for
//! [`viban_engine::WorktreeManager::create_worktree`]. Repository cloning and
//! registration are a data-layer concern excluded by SPEC_FULL.md's
//! Non-goals; this trait is the narrow seam the core needs instead.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use viban_core::BoardId;
use viban_engine::RepoLocation;

use crate::error::ActorError;

#[async_trait]
pub trait RepoLocator: Send + Sync {
    async fn locate(&self, board_id: BoardId) -> Result<RepoLocation, ActorError>;
}

/// Fixed board → repository map, good enough for a single-repo deployment or
/// tests. A real deployment's data layer would back this with a board
/// settings row instead.
#[derive(Default)]
pub struct StaticRepoLocator {
    repos: HashMap<BoardId, RepoLocation>,
}

impl StaticRepoLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, board_id: BoardId, repo_root: PathBuf, default_branch: impl Into<String>) {
        self.repos.insert(
            board_id,
            RepoLocation {
                repo_root,
                default_branch: default_branch.into(),
            },
        );
    }
}

#[async_trait]
impl RepoLocator for StaticRepoLocator {
    async fn locate(&self, board_id: BoardId) -> Result<RepoLocation, ActorError> {
        self.repos
            .get(&board_id)
            .map(|r| RepoLocation {
                repo_root: r.repo_root.clone(),
                default_branch: r.default_branch.clone(),
            })
            .ok_or_else(|| ActorError::NoRepoLocation(board_id.to_string()))
    }
}

#[cfg(test)]
#[path = "repo_locator_tests.rs"]
mod tests;
