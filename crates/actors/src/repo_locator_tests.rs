// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use super::*;

#[tokio::test]
async fn locate_returns_registered_repo() {
    let mut locator = StaticRepoLocator::new();
    let board_id = BoardId::new();
    locator.register(board_id, PathBuf::from("/repos/demo"), "main");

    let repo = locator.locate(board_id).await.unwrap();
    assert_eq!(repo.repo_root, PathBuf::from("/repos/demo"));
    assert_eq!(repo.default_branch, "main");
}

#[tokio::test]
async fn locate_unknown_board_errors() {
    let locator = StaticRepoLocator::new();
    let err = locator.locate(BoardId::new()).await.unwrap_err();
    assert!(matches!(err, ActorError::NoRepoLocation(_)));
}
