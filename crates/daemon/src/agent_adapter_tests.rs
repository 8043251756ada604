// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn cat_echoes_the_prompt_back_as_output() {
    let adapter = ProcessAgentAdapter::new();
    let dir = tempfile::tempdir().unwrap();
    let result = adapter
        .start("cat", "hello from the prompt", dir.path(), true)
        .await
        .unwrap();
    assert_eq!(result, "hello from the prompt");
}

#[tokio::test]
async fn nonzero_exit_is_executor_failed() {
    let adapter = ProcessAgentAdapter::new();
    let dir = tempfile::tempdir().unwrap();
    let err = adapter
        .start("false", "", dir.path(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExecutorFailed(_)));
}

#[tokio::test]
async fn unknown_program_surfaces_as_io_error() {
    let adapter = ProcessAgentAdapter::new();
    let dir = tempfile::tempdir().unwrap();
    let err = adapter
        .start("viban-definitely-not-a-real-binary", "", dir.path(), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}

#[tokio::test]
async fn stop_is_a_harmless_no_op() {
    let adapter = ProcessAgentAdapter::new();
    adapter.stop(TaskId::new(), "task moved").await.unwrap();
}
