//! Record-replay round trip through the board accessor.
//!
//! 1. Run a session against the in-memory backend with recording enabled.
//! 2. Replay the cassette through a fresh accessor.
//! 3. Assert identical outputs, and that an exhausted cassette fails cleanly.

use std::sync::Arc;

use boardgate::adapters::{MemoryBackend, ReplayingDispatcher};
use boardgate::board::CASSETTE_FILE;
use boardgate::model::{BoardColumn, DependencyKind, MinimalCard, NewIssue};
use boardgate::testing::{ManualClock, SequentialIdGenerator};
use boardgate::{BoardAccessor, ErrorKind, GatewayConfig, Timeouts};

async fn session(accessor: &BoardAccessor) -> (Vec<MinimalCard>, usize, ErrorKind) {
    let a = accessor.create_issue(NewIssue::titled("first \"one\"")).await.unwrap();
    let b = accessor.create_issue(NewIssue::titled("second")).await.unwrap();
    accessor.add_dependency(&a, &b, DependencyKind::Blocks).await.unwrap();
    let cards = accessor.get_board_minimal().await.unwrap();
    let blocked = accessor.get_column_count(BoardColumn::Blocked).await.unwrap();
    let missing = accessor.get_issue_full("bd-404").await.unwrap_err().kind();
    (cards, blocked, missing)
}

#[tokio::test]
async fn record_then_replay_produces_identical_outputs() {
    let dir = std::env::temp_dir().join(format!("boardgate_record_replay_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    // --- Phase 1: record ---
    let clock = Arc::new(ManualClock::default());
    let backend = MemoryBackend::new(clock.clone(), Arc::new(SequentialIdGenerator::new("bd")));
    let config = GatewayConfig { record_dir: Some(dir.clone()), ..GatewayConfig::default() };
    let recording = BoardAccessor::with_dispatcher_and_config(Arc::new(backend), clock, &config);
    let recorded = session(&recording).await;
    let path = recording.finish_recording().unwrap().unwrap();
    assert_eq!(path, dir.join(CASSETTE_FILE));
    assert_eq!(recorded.1, 1);
    assert_eq!(recorded.2, ErrorKind::NotFound);

    // --- Phase 2: replay ---
    let replaying = Arc::new(ReplayingDispatcher::from_file(&path).unwrap());
    assert_eq!(replaying.remaining(), 6);
    let accessor = BoardAccessor::with_dispatcher(
        replaying.clone(),
        Arc::new(ManualClock::default()),
        Timeouts::default(),
    );
    let replayed = session(&accessor).await;
    assert_eq!(replayed, recorded);
    assert_eq!(replaying.remaining(), 0);

    // --- Phase 3: nothing left to serve ---
    let err = accessor.get_board_minimal().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let _ = std::fs::remove_dir_all(&dir);
}
