// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use viban_core::TaskId;

#[tokio::test]
async fn subscriber_receives_published_message_on_same_topic() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe("task:updates");
    let task_id = TaskId::new();
    bus.publish("task:updates", TaskExecuteSignal { task_id });

    let BusMessage::TaskExecute(signal) = rx.recv().await.unwrap() else {
        panic!("expected TaskExecute");
    };
    assert_eq!(signal.task_id, task_id);
}

#[tokio::test]
async fn publish_with_no_subscribers_does_not_panic() {
    let bus = EventBus::new();
    bus.publish(
        "task:updates",
        TaskExecuteSignal {
            task_id: TaskId::new(),
        },
    );
}

#[tokio::test]
async fn subscribers_on_different_topics_are_isolated() {
    let bus = EventBus::new();
    let mut a_rx = bus.subscribe("topic:a");
    let mut b_rx = bus.subscribe("topic:b");
    bus.publish(
        "topic:a",
        TaskExecuteSignal {
            task_id: TaskId::new(),
        },
    );

    assert!(a_rx.try_recv().is_ok());
    assert!(b_rx.try_recv().is_err());
}
