// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! EventBus (C9, publish/subscribe half): topic-addressed broadcast channels.
//! Grounded on spec Design Notes §9 ("Mailboxes with selective receive become
//! typed bounded channels with a single consumer per actor") and
//! `oj-daemon`'s own `tokio::sync::broadcast` usage for its task-update
//! fan-out. Deliveries to subscribers of one topic preserve publish order,
//! per `broadcast`'s own guarantee.

use dashmap::DashMap;
use tokio::sync::broadcast;
use viban_core::event::{ExecutorCompleted, HookExecutedNotification, TaskExecuteSignal, TaskLifecycleEvent};

/// Capacity of each topic's broadcast channel. A slow subscriber that falls
/// this far behind starts missing messages (`RecvError::Lagged`); callers
/// that care about every message (TaskActor order-sensitive consumers) must
/// keep their receive loop hot.
const CHANNEL_CAPACITY: usize = 256;

/// Everything published on the core's four named topics (spec §4.9),
/// wrapped in one enum so a single broadcast channel type serves all of them.
#[derive(Debug, Clone)]
pub enum BusMessage {
    TaskLifecycle(TaskLifecycleEvent),
    TaskExecute(TaskExecuteSignal),
    ExecutorCompleted(ExecutorCompleted),
    HookExecuted(HookExecutedNotification),
}

impl From<TaskLifecycleEvent> for BusMessage {
    fn from(event: TaskLifecycleEvent) -> Self {
        Self::TaskLifecycle(event)
    }
}
impl From<TaskExecuteSignal> for BusMessage {
    fn from(signal: TaskExecuteSignal) -> Self {
        Self::TaskExecute(signal)
    }
}
impl From<ExecutorCompleted> for BusMessage {
    fn from(completed: ExecutorCompleted) -> Self {
        Self::ExecutorCompleted(completed)
    }
}
impl From<HookExecutedNotification> for BusMessage {
    fn from(notification: HookExecutedNotification) -> Self {
        Self::HookExecuted(notification)
    }
}

/// Topic-addressed publish/subscribe. A topic's channel is created lazily on
/// first publish or subscribe and lives for the process's lifetime — topics
/// are never explicitly torn down, matching `oj-daemon`'s static topic set.
#[derive(Default)]
pub struct EventBus {
    topics: DashMap<String, broadcast::Sender<BusMessage>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        if let Some(sender) = self.topics.get(topic) {
            return sender.clone();
        }
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publish `message` on `topic`. A topic with no subscribers yet is not
    /// an error — the send is simply dropped, same as `oj-daemon`'s fan-out
    /// bus when nothing has subscribed.
    pub fn publish(&self, topic: &str, message: impl Into<BusMessage>) {
        let _ = self.sender_for(topic).send(message.into());
    }

    /// Subscribe to `topic`. The returned receiver only observes messages
    /// published after this call.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<BusMessage> {
        self.sender_for(topic).subscribe()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
