//! End-to-end reorder over an on-disk SQLite collection.

use coin_vault::config::AppConfig;
use coin_vault::domain::{Coin, CoinDisplay};
use coin_vault::reorder::{ranks_are_dense, ReorderOutcome, ReorderState};
use coin_vault::repository::Repository;
use coin_vault::AppState;

const OWNER: &str = "collector@example.com";

async fn open_in(dir: &tempfile::TempDir) -> AppState {
    let config = AppConfig {
        db_path: dir.path().join("vault").join("coins.db"),
        ..Default::default()
    };
    AppState::open(config).await.expect("open sqlite backend")
}

#[tokio::test]
async fn reorder_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let state = open_in(&dir).await;
    let repo = state.coin_repo().expect("sqlite repo");
    for name in ["Navy", "Army", "Air Force", "Marines"] {
        repo.create(&Coin::new(OWNER, CoinDisplay::named(name))).await.unwrap();
    }

    let engine = state.engine(OWNER);
    engine.load().await.unwrap();
    assert!(engine.begin_drag(3));
    assert_eq!(engine.end_drag(Some(0)).await, ReorderOutcome::Committed);
    assert_eq!(engine.state(), ReorderState::Idle);
    state.close().await;

    let reopened = open_in(&dir).await;
    let engine = reopened.engine(OWNER);
    engine.load().await.unwrap();
    let view = engine.view();
    let names: Vec<_> = view.coins.iter().map(|c| c.display.name.as_str()).collect();
    assert_eq!(names, vec!["Marines", "Navy", "Army", "Air Force"]);
    assert!(ranks_are_dense(&view.coins));
    assert!(view.in_sync);
    reopened.close().await;
}

#[tokio::test]
async fn owners_do_not_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_in(&dir).await;
    let repo = state.coin_repo().unwrap();
    repo.create(&Coin::new(OWNER, CoinDisplay::named("Mine"))).await.unwrap();
    repo.create(&Coin::new("other@example.com", CoinDisplay::named("Theirs"))).await.unwrap();

    let engine = state.engine(OWNER);
    engine.load().await.unwrap();
    assert_eq!(engine.view().coins.len(), 1);
    assert_eq!(engine.view().total, 1);

    // a single coin never reaches the store
    assert!(engine.begin_drag(0));
    assert_eq!(engine.end_drag(Some(0)).await, ReorderOutcome::Cancelled);
    state.close().await;
}
