// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProcessAgentAdapter`: the concrete [`AgentAdapter`] the daemon wires up,
//! grounded on `HookRunner::execute_script`'s own
//! temp-file-then-`tokio::process::Command` pattern in `viban-engine` — an
//! AI executor is, from this crate's point of view, just another child
//! process whose stdout is the result.
//!
//! Non-goal per SPEC_FULL.md: AI agent internals (how `executor_id` resolves
//! to a concrete model/CLI) are out of scope. This adapter only knows how to
//! run `executor_id` as a program on `$PATH`, feeding it the prompt on
//! stdin — swapping in a richer router (HTTP, Docker, Kubernetes, as
//! `oj-daemon`'s own `adapters::agent` does) is a deployment concern, not a
//! substrate one.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use viban_core::TaskId;
use viban_engine::{AgentAdapter, EngineError};

/// Env var set to `"1"` on the child process when a hook ran with
/// `auto_approve`, so a wrapped CLI can skip any interactive confirmation —
/// mirrors `oj-daemon`'s `augment_command_for_skip_permissions`.
const AUTO_APPROVE_ENV: &str = "VIBAN_AUTO_APPROVE";

pub struct ProcessAgentAdapter;

impl ProcessAgentAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessAgentAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentAdapter for ProcessAgentAdapter {
    async fn start(
        &self,
        executor_id: &str,
        prompt: &str,
        working_directory: &Path,
        auto_approve: bool,
    ) -> Result<String, EngineError> {
        info!(executor_id, %auto_approve, dir = %working_directory.display(), "starting agent executor");

        let mut command = tokio::process::Command::new(executor_id);
        command
            .current_dir(working_directory)
            .env(AUTO_APPROVE_ENV, if auto_approve { "1" } else { "0" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(EngineError::Io)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await.map_err(EngineError::Io)?;
        }

        let output = child.wait_with_output().await.map_err(EngineError::Io)?;
        let captured = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if output.status.success() {
            Ok(captured)
        } else {
            let code = output.status.code().unwrap_or(-1);
            warn!(executor_id, code, "agent executor exited non-zero");
            Err(EngineError::ExecutorFailed(code))
        }
    }

    /// No attach-and-signal protocol wired up yet (Non-goal: AI agent
    /// internals) — a move during execution still cancels the pipeline on
    /// the `TaskActor` side; the child process itself runs to completion and
    /// its eventual `executor_completed` is a safe no-op by then.
    async fn stop(&self, task_id: TaskId, reason: &str) -> Result<(), EngineError> {
        info!(%task_id, reason, "stop requested; executor has no cancellation hook, ignoring");
        Ok(())
    }
}

#[cfg(test)]
#[path = "agent_adapter_tests.rs"]
mod tests;
