// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HookRunner (C2): dispatches one hook run by `hook.kind`. Stateless —
//! every call takes everything it needs as arguments.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};
use viban_core::event::HookEffects;
use viban_core::{Hook, HookKind, Task, TaskId};

use crate::error::EngineError;

/// Per-call options threaded through to script/agent/system dispatch.
#[derive(Debug, Clone, Default)]
pub struct HookOpts {
    pub board_id: String,
    pub hook_settings: Map<String, Value>,
    pub auto_approve: bool,
}

/// What a hook run produced. `Skipped` and `AwaitExecutor` are not errors —
/// they are the two non-`Completed` members of the codomain spec §4.2 names.
#[derive(Debug, Clone)]
pub enum HookOutcome {
    /// `effects` carries UI side-effects a system hook wants attached to its
    /// `kanban_lite:board:<board_id>` notification (spec §6's event wire
    /// format) — e.g. `system:play-sound` setting `play_sound`. Script and
    /// agent hooks always complete with the default (empty) effects.
    Completed { output: String, effects: HookEffects },
    Skipped,
    AwaitExecutor { task_id: TaskId },
}

impl HookOutcome {
    pub fn completed(output: impl Into<String>) -> Self {
        Self::Completed {
            output: output.into(),
            effects: HookEffects::default(),
        }
    }
}

pub type HookResult = Result<HookOutcome, EngineError>;

/// Spawns and tracks a named AI executor in a worktree. `viban-engine` only
/// defines the boundary (spec's Non-goal: AI agent internals); a real
/// implementation lives outside this crate.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    async fn start(
        &self,
        executor_id: &str,
        prompt: &str,
        working_directory: &Path,
        auto_approve: bool,
    ) -> Result<String, EngineError>;

    /// Requests termination of a previously started executor (spec §6's
    /// `stop_by_task`). The default no-op suits adapters that cannot cancel
    /// mid-flight: the process runs to completion and reports its exit
    /// through the normal `executor_completed` path, which a TaskActor that
    /// has already moved the task to another column safely ignores.
    async fn stop(&self, _task_id: TaskId, _reason: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

/// One built-in system hook implementation, looked up by id
/// (`system:<slug>`) in a [`SystemHookRegistry`].
#[async_trait]
pub trait SystemHook: Send + Sync {
    async fn execute(&self, task: &Task, column_name: &str, opts: &HookOpts) -> HookResult;
}

/// Process-wide registry of built-in system hooks, keyed by id. Reserved ids
/// named in spec §6 (`system:execute-ai`, `system:refine-prompt`,
/// `system:play-sound`, `system:move-task`) are registered by the binary
/// that assembles the runtime, not by this crate.
#[derive(Default, Clone)]
pub struct SystemHookRegistry {
    hooks: HashMap<String, Arc<dyn SystemHook>>,
}

impl SystemHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, hook: Arc<dyn SystemHook>) {
        self.hooks.insert(id.into(), hook);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn SystemHook>> {
        self.hooks.get(id).cloned()
    }
}

pub struct HookRunner<A: AgentAdapter> {
    agent_adapter: Arc<A>,
    system_hooks: SystemHookRegistry,
}

impl<A: AgentAdapter> HookRunner<A> {
    pub fn new(agent_adapter: Arc<A>, system_hooks: SystemHookRegistry) -> Self {
        Self {
            agent_adapter,
            system_hooks,
        }
    }

    pub async fn execute(
        &self,
        hook: &Hook,
        task: &Task,
        column_name: &str,
        opts: HookOpts,
    ) -> HookResult {
        match hook.kind {
            HookKind::Script => self.execute_script(hook, task).await,
            HookKind::Agent => self.execute_agent(hook, task, column_name, &opts).await,
            HookKind::System => self.execute_system(hook, task, column_name, &opts).await,
        }
    }

    async fn execute_script(&self, hook: &Hook, task: &Task) -> HookResult {
        let Some(worktree_path) = task.worktree_path.as_deref() else {
            warn!(hook = %hook.name, task = %task.id, "script hook skipped: no worktree");
            return Ok(HookOutcome::Skipped);
        };
        let worktree = Path::new(worktree_path);
        if !worktree.is_dir() {
            warn!(hook = %hook.name, task = %task.id, %worktree_path, "script hook skipped: worktree missing");
            return Ok(HookOutcome::Skipped);
        }

        let command = hook.command.as_deref().unwrap_or_default();
        let script_body = if command.starts_with("#!") {
            command.to_string()
        } else {
            format!("#!/bin/bash\nset -e\n{command}\n")
        };

        let script_file = tempfile::Builder::new()
            .prefix("viban-hook-")
            .tempfile()
            .map_err(EngineError::Io)?;
        tokio::fs::write(script_file.path(), script_body.as_bytes())
            .await
            .map_err(EngineError::Io)?;
        make_executable(script_file.path()).await?;

        info!(hook = %hook.name, task = %task.id, "running script hook");
        let output = tokio::process::Command::new(script_file.path())
            .current_dir(worktree)
            .output()
            .await
            .map_err(EngineError::Io)?;

        // tempfile's Drop removes the file on every exit path, including early returns above.
        drop(script_file);

        let captured = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if output.status.success() {
            Ok(HookOutcome::completed(captured))
        } else {
            let code = output.status.code().unwrap_or(-1);
            Err(EngineError::ExitCode {
                code,
                output: captured,
            })
        }
    }

    async fn execute_agent(
        &self,
        hook: &Hook,
        task: &Task,
        column_name: &str,
        opts: &HookOpts,
    ) -> HookResult {
        let prompt = build_agent_prompt(hook, task, column_name);
        let Some(executor_id) = hook.agent_executor.as_deref() else {
            return Err(EngineError::UnknownHook(hook.id.to_string()));
        };
        let working_directory = task
            .worktree_path
            .as_deref()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("."));

        let result = self
            .agent_adapter
            .start(executor_id, &prompt, working_directory, opts.auto_approve)
            .await?;
        Ok(HookOutcome::completed(result))
    }

    /// Requests termination of whatever executor is running for `task_id`
    /// (spec §6's `stop_by_task`, driven by the column-change cancellation
    /// path in spec §4.5.4 step 1). Delegates to the agent adapter; system
    /// hooks that background their own executor (e.g. `system:execute-ai`)
    /// are expected to race the same underlying process handle, so there is
    /// nothing further for the runner itself to track.
    pub async fn stop(&self, task_id: TaskId, reason: &str) -> Result<(), EngineError> {
        self.agent_adapter.stop(task_id, reason).await
    }

    async fn execute_system(
        &self,
        hook: &Hook,
        task: &Task,
        column_name: &str,
        opts: &HookOpts,
    ) -> HookResult {
        let id = hook.id.as_str();
        match self.system_hooks.get(id) {
            Some(system_hook) => system_hook.execute(task, column_name, opts).await,
            None => Err(EngineError::UnknownHook(id.to_string())),
        }
    }
}

/// Build the prompt an "agent" hook runs, from the hook's template plus task
/// and column context.
fn build_agent_prompt(hook: &Hook, task: &Task, column_name: &str) -> String {
    let sections = [
        hook.agent_prompt.clone().unwrap_or_default(),
        format!("## Task\n\n{}\n\n{}", task.title, task.description),
        format!("## Column\n\n{column_name}"),
    ];
    sections.join("\n\n---\n\n")
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = tokio::fs::metadata(path)
        .await
        .map_err(EngineError::Io)?
        .permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(path, perms)
        .await
        .map_err(EngineError::Io)
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), EngineError> {
    Ok(())
}

#[cfg(test)]
#[path = "hook_runner_tests.rs"]
mod tests;
