// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vibanup`: assembles the execution substrate — data layer, EventBus,
//! system-hook registry, BoardManager — and runs it until `SIGTERM`/ctrl-c.

mod agent_adapter;
mod config;
mod system_hooks;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viban_actors::{BoardManager, ColumnSemaphoreRegistry, EventBus, StaticRepoLocator};
use viban_actors::board_manager::BoardManagerDeps;
use viban_actors::task_actor::TaskActorDeps;
use viban_core::SystemClock;
use viban_engine::{HookRunner, SystemHookRegistry, WorktreeManager};
use viban_store::{DataLayer, MemoryStore, PgStore};

use crate::agent_adapter::ProcessAgentAdapter;
use crate::config::Config;
use crate::system_hooks::{ExecuteAiHook, MoveTaskHook, PlaySoundHook, RefinePromptHook};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(worktree_base = %config.worktree_base.display(), has_database = config.database_url.is_some(), "vibanup starting");

    // Both backends implement `DataLayer` and `HookExecutionLog` on the same
    // concrete type; clone the concrete `Arc` before erasing so both trait
    // objects point at one underlying store instead of two independent ones.
    let (data, hook_log): (Arc<dyn DataLayer>, Arc<dyn viban_store::HookExecutionLog>) = match &config.database_url {
        Some(url) => {
            info!("connecting to Postgres");
            let store = Arc::new(PgStore::connect(url).await?);
            (store.clone(), store)
        }
        None => {
            info!("no database configured, using in-memory store");
            let store = Arc::new(MemoryStore::default());
            (store.clone(), store)
        }
    };

    let bus = Arc::new(EventBus::new());
    let adapter = Arc::new(ProcessAgentAdapter::new());

    let mut system_hooks = SystemHookRegistry::new();
    system_hooks.register("system:execute-ai", Arc::new(ExecuteAiHook::new(adapter.clone(), bus.clone())));
    system_hooks.register("system:refine-prompt", Arc::new(RefinePromptHook::new(adapter.clone())));
    system_hooks.register("system:play-sound", Arc::new(PlaySoundHook));
    system_hooks.register("system:move-task", Arc::new(MoveTaskHook::new(data.clone())));

    let hook_runner = Arc::new(HookRunner::new(adapter, system_hooks));
    let worktree_manager = Arc::new(WorktreeManager::new(config.worktree_base.clone()));
    let repo_locator = Arc::new(StaticRepoLocator::new());

    let task_actor_deps = TaskActorDeps {
        data: data.clone(),
        log: hook_log,
        hook_runner,
        worktree_manager,
        repo_locator,
        semaphores: Arc::new(ColumnSemaphoreRegistry::new()),
        bus: bus.clone(),
        clock: Arc::new(SystemClock),
    };

    let manager = Arc::new(BoardManager::new(BoardManagerDeps {
        data: data.clone(),
        bus,
        task_actor_deps,
    }));

    manager.reconcile().await?;
    info!(boards = manager.list_boards().len(), "reconciled boards on boot");

    wait_for_shutdown_signal().await;

    info!("shutdown signal received, draining boards");
    manager.shutdown_all();

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(%err, "failed to install SIGTERM handler, falling back to ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
