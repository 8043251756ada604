// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WorktreeManager (C3): creates and removes git worktrees for tasks by
//! shelling out to the `git` CLI, exactly as `oj-daemon`'s
//! `engine::workspace_fs`/`executor` do — no `git2`, no vendored libgit.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{info, warn};
use viban_core::{BoardId, TaskId};

use crate::error::EngineError;

const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a board's primary repository lives, resolved by the caller (the
/// data layer owns board → repo mapping; out of scope for this crate per
/// SPEC_FULL.md Non-goals "repository cloning mechanics").
pub struct RepoLocation {
    pub repo_root: PathBuf,
    pub default_branch: String,
}

pub struct CreatedWorktree {
    pub path: PathBuf,
    pub branch: String,
}

/// Creates worktrees under `<base>/<board_id>/<task_id>` and removes them on
/// task teardown. Idempotent: a repeated create for the same task returns the
/// existing worktree rather than erroring.
pub struct WorktreeManager {
    base_dir: PathBuf,
}

impl WorktreeManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn task_worktree_dir(&self, board_id: &BoardId, task_id: &TaskId) -> PathBuf {
        self.base_dir.join(board_id.as_str()).join(task_id.as_str())
    }

    fn branch_name(task_id: &TaskId, custom_branch_name: Option<&str>) -> String {
        match custom_branch_name {
            Some(name) => sanitize_branch_name(name),
            None => format!("task/{task_id}"),
        }
    }

    pub async fn create_worktree(
        &self,
        board_id: &BoardId,
        task_id: &TaskId,
        repo: &RepoLocation,
        custom_branch_name: Option<&str>,
    ) -> Result<CreatedWorktree, EngineError> {
        let path = self.task_worktree_dir(board_id, task_id);
        let branch = Self::branch_name(task_id, custom_branch_name);

        if path.is_dir() {
            info!(task = %task_id, path = %path.display(), "worktree already exists, reusing");
            return Ok(CreatedWorktree { path, branch });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(EngineError::Io)?;
        }

        info!(task = %task_id, branch = %branch, "creating git worktree");
        let mut cmd = Command::new("git");
        cmd.args([
            "-C",
            &repo.repo_root.display().to_string(),
            "worktree",
            "add",
            "-b",
            &branch,
            &path.display().to_string(),
            &repo.default_branch,
        ])
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");

        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT).await?;
        if !output.status.success() {
            return Err(EngineError::Worktree(format!(
                "git worktree add failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(CreatedWorktree { path, branch })
    }

    /// Best-effort: removes the worktree directory and prunes the branch.
    /// Failures are logged, not propagated — teardown must not block a
    /// TaskActor from finishing its shutdown.
    pub async fn remove_worktree(&self, task_id: &TaskId, path: &Path, branch: &str) {
        if !path.exists() {
            return;
        }
        let repo_root = match find_repo_root(path).await {
            Some(root) => root,
            None => {
                warn!(task = %task_id, path = %path.display(), "could not resolve repo root, removing directory only");
                let _ = tokio::fs::remove_dir_all(path).await;
                return;
            }
        };

        let mut remove_cmd = Command::new("git");
        remove_cmd.args([
            "-C",
            &repo_root.display().to_string(),
            "worktree",
            "remove",
            "--force",
            &path.display().to_string(),
        ]);
        if let Err(err) = run_with_timeout(remove_cmd, GIT_WORKTREE_TIMEOUT).await {
            warn!(task = %task_id, %err, "git worktree remove failed, falling back to rm -rf");
            let _ = tokio::fs::remove_dir_all(path).await;
        }

        let mut branch_cmd = Command::new("git");
        branch_cmd.args(["-C", &repo_root.display().to_string(), "branch", "-D", branch]);
        if let Err(err) = run_with_timeout(branch_cmd, GIT_WORKTREE_TIMEOUT).await {
            warn!(task = %task_id, %err, "failed to prune worktree branch");
        }
    }
}

/// Reads `<path>/.git` (a worktree's `.git` is a file, not a directory,
/// containing `gitdir: <repo>/.git/worktrees/<name>`) to find the owning
/// repository's root.
async fn find_repo_root(path: &Path) -> Option<PathBuf> {
    let git_file = path.join(".git");
    let contents = tokio::fs::read_to_string(&git_file).await.ok()?;
    let gitdir = contents.trim().strip_prefix("gitdir:")?.trim();
    // `.../<repo>/.git/worktrees/<name>` -> `<repo>`
    Path::new(gitdir)
        .ancestors()
        .find(|p| p.file_name().is_some_and(|n| n == ".git"))
        .and_then(|git_dir| git_dir.parent())
        .map(Path::to_path_buf)
}

async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<std::process::Output, EngineError> {
    tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| EngineError::Timeout)?
        .map_err(EngineError::Io)
}

fn sanitize_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "worktree_manager_tests.rs"]
mod tests;
