// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven configuration, mirroring `oj-daemon`'s `daemon::env`
//! fallback-chain convention (`OJ_STATE_DIR` > `XDG_STATE_HOME` > `$HOME`)
//! and `DBService::new`'s `DATABASE_URL` default.

use std::path::PathBuf;

/// Where `vibanup` keeps worktrees, and which Postgres instance (if any)
/// backs the data layer. `None` for `database_url` means: fall back to
/// [`viban_store::MemoryStore`] rather than connecting to Postgres.
#[derive(Debug, Clone)]
pub struct Config {
    pub worktree_base: PathBuf,
    pub database_url: Option<String>,
    pub log_filter: String,
}

impl Config {
    /// Resolve configuration from the environment. Every field has a
    /// sane default; nothing here can fail.
    pub fn from_env() -> Self {
        Self {
            worktree_base: worktree_base(),
            database_url: database_url(),
            log_filter: log_filter(),
        }
    }
}

/// Worktree base directory: `VIBAN_WORKTREE_BASE` > `XDG_STATE_HOME/viban/worktrees`
/// > `~/.local/state/viban/worktrees`.
fn worktree_base() -> PathBuf {
    if let Ok(dir) = std::env::var("VIBAN_WORKTREE_BASE") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("viban/worktrees");
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".local/state/viban/worktrees")
}

/// `VIBAN_DATABASE_URL` (or bare `DATABASE_URL`, for drop-in compatibility
/// with the Postgres sibling's env convention). Unset means "use the
/// in-memory store".
fn database_url() -> Option<String> {
    std::env::var("VIBAN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|s| !s.is_empty())
}

/// `tracing_subscriber::EnvFilter` source string: `RUST_LOG` if set, else `info`.
fn log_filter() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
