//! Board accessor scenarios against the in-memory backend.

use std::collections::HashSet;
use std::sync::Arc;

use boardgate::model::{BoardColumn, DependencyKind, IssueUpdate, NewIssue, Status};
use boardgate::testing::{ManualClock, SequentialIdGenerator};
use boardgate::{BoardAccessor, ErrorKind};

fn board() -> (Arc<ManualClock>, BoardAccessor) {
    let clock = Arc::new(ManualClock::default());
    let accessor =
        BoardAccessor::in_memory(clock.clone(), Arc::new(SequentialIdGenerator::new("bd")));
    (clock, accessor)
}

async fn create(accessor: &BoardAccessor, title: &str) -> String {
    accessor.create_issue(NewIssue::titled(title)).await.unwrap()
}

#[tokio::test]
async fn blocked_issue_leaves_ready_until_its_blocker_closes() {
    let (_, accessor) = board();
    let a = create(&accessor, "A").await;
    let b = create(&accessor, "B").await;
    let c = create(&accessor, "C").await;
    accessor.add_dependency(&b, &a, DependencyKind::Blocks).await.unwrap();

    let ready: HashSet<String> = accessor
        .get_column_data(BoardColumn::Ready, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ready, HashSet::from([b.clone(), c.clone()]));
    assert!(!ready.contains(&a));
    assert_eq!(accessor.get_column_count(BoardColumn::Ready).await.unwrap(), 2);

    // Resolution happens on the next read, with no extra call.
    accessor.close_issue(&b).await.unwrap();
    let ready: HashSet<String> = accessor
        .get_column_data(BoardColumn::Ready, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ready, HashSet::from([a, c]));
}

#[tokio::test]
async fn blocker_chain_and_resolution() {
    let (_, accessor) = board();
    let a = create(&accessor, "A").await;
    let b = create(&accessor, "B").await;
    let c = create(&accessor, "C").await;
    accessor.add_dependency(&b, &a, DependencyKind::Blocks).await.unwrap();
    accessor.add_dependency(&c, &a, DependencyKind::Blocks).await.unwrap();

    let full = accessor.get_issue_full(&a).await.unwrap();
    assert_eq!(full.card.blocked_by_count, 2);
    assert!(!full.card.is_ready);
    assert_eq!(full.blocked_by.len(), 2);
    assert_eq!(accessor.get_issue_full(&b).await.unwrap().card.blocks_count, 1);

    let blocked = accessor.get_column_data(BoardColumn::Blocked, 0, 10).await.unwrap();
    assert_eq!(blocked.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec![a.as_str()]);

    accessor.close_issue(&b).await.unwrap();
    let full = accessor.get_issue_full(&a).await.unwrap();
    assert_eq!(full.card.blocked_by_count, 1);

    accessor.set_issue_status(&c, "closed").await.unwrap();
    let full = accessor.get_issue_full(&a).await.unwrap();
    assert_eq!(full.card.blocked_by_count, 0);
    assert!(full.card.is_ready);
    assert_eq!(accessor.get_column_count(BoardColumn::Ready).await.unwrap(), 1);
    assert_eq!(accessor.get_column_count(BoardColumn::Closed).await.unwrap(), 2);
}

#[tokio::test]
async fn closed_at_tracks_status() {
    let (clock, accessor) = board();
    let id = create(&accessor, "close me").await;
    assert_eq!(accessor.get_issue_full(&id).await.unwrap().card.closed_at, None);

    clock.advance_ms(5_000);
    accessor.set_issue_status(&id, "closed").await.unwrap();
    let closed = accessor.get_issue_full(&id).await.unwrap();
    assert_eq!(closed.card.closed_at, Some(closed.card.updated_at));

    accessor.set_issue_status(&id, "open").await.unwrap();
    let reopened = accessor.get_issue_full(&id).await.unwrap();
    assert_eq!(reopened.card.status, Status::Open);
    assert_eq!(reopened.card.closed_at, None);
}

#[tokio::test]
async fn pagination_partitions_a_column() {
    let (_, accessor) = board();
    let total = 23;
    for i in 0..total {
        create(&accessor, &format!("issue {i}")).await;
    }
    let page_size = 5;
    assert_eq!(accessor.get_column_count(BoardColumn::Ready).await.unwrap(), total);

    let mut seen = HashSet::new();
    let mut offset = 0;
    let mut last_len = 0;
    while offset < total {
        let page = accessor.get_column_data(BoardColumn::Ready, offset, page_size).await.unwrap();
        assert!(page.len() <= page_size);
        for card in &page {
            assert!(seen.insert(card.id.clone()), "duplicate card {}", card.id);
        }
        last_len = page.len();
        offset += page_size;
    }
    assert_eq!(seen.len(), total);
    assert_eq!(last_len, total % page_size);

    let past_end = accessor.get_column_data(BoardColumn::Ready, total, page_size).await.unwrap();
    assert!(past_end.is_empty());
    let empty = accessor.get_column_data(BoardColumn::Ready, 0, 0).await.unwrap();
    assert!(empty.is_empty());
    let everything = accessor.get_column_data(BoardColumn::Ready, 0, usize::MAX).await.unwrap();
    assert_eq!(everything.len(), total);
}

#[tokio::test]
async fn awkward_text_round_trips_verbatim() {
    let (_, accessor) = board();
    let bystander = create(&accessor, "bystander").await;
    let title = "Robert'); DELETE FROM issues; -- \"quoted\" \0 end";
    let mut issue = NewIssue::titled(title);
    issue.description = "line one\nline two; `rm -rf /`".into();
    let id = accessor.create_issue(issue).await.unwrap();

    accessor.add_label(&id, "needs \"review\"").await.unwrap();
    accessor.add_comment(&id, "DROP TABLE comments;", "o'brien").await.unwrap();

    let full = accessor.get_issue_full(&id).await.unwrap();
    assert_eq!(full.card.title, title);
    assert_eq!(full.description, "line one\nline two; `rm -rf /`");
    assert_eq!(full.labels, vec!["needs \"review\"".to_string()]);
    assert_eq!(full.comments[0].text, "DROP TABLE comments;");
    assert_eq!(full.comments[0].author, "o'brien");

    let renamed = "it's; \"done\" \0 DELETE FROM issues;";
    let external = "a'b;\"c\0 DELETE FROM issues;";
    let update = IssueUpdate {
        title: Some(renamed.into()),
        external_ref: Some(Some(external.into())),
        ..IssueUpdate::default()
    };
    accessor.update_issue(&id, update).await.unwrap();
    let full = accessor.get_issue_full(&id).await.unwrap();
    assert_eq!(full.card.title.as_bytes(), renamed.as_bytes());
    assert_eq!(full.external_ref.as_deref().map(str::as_bytes), Some(external.as_bytes()));

    let untouched = accessor.get_issue_full(&bystander).await.unwrap();
    assert_eq!(untouched.card.title, "bystander");
    assert_eq!(untouched.external_ref, None);
    assert_eq!(accessor.get_board_minimal().await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_issues_are_not_found() {
    let (_, accessor) = board();
    let existing = create(&accessor, "real").await;

    let err = accessor.get_issue_full("bd-404").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = accessor.set_issue_status("bd-404", "closed").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let update = IssueUpdate { title: Some("renamed".into()), ..IssueUpdate::default() };
    let err = accessor.update_issue("bd-404", update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err =
        accessor.add_dependency(&existing, "bd-404", DependencyKind::Blocks).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Caller errors leave the breaker alone.
    assert_eq!(accessor.breaker().consecutive_failures, 0);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let (_, accessor) = board();
    let id = create(&accessor, "target").await;

    let err = accessor.create_issue(NewIssue::titled("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = accessor.set_issue_status(&id, "finished").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = accessor.add_dependency(&id, &id, DependencyKind::Blocks).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let update = IssueUpdate { priority: Some(9), ..IssueUpdate::default() };
    let err = accessor.update_issue(&id, update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn blocking_cycles_are_refused() {
    let (_, accessor) = board();
    let a = create(&accessor, "a").await;
    let b = create(&accessor, "b").await;
    let c = create(&accessor, "c").await;
    accessor.add_dependency(&a, &b, DependencyKind::Blocks).await.unwrap();
    accessor.add_dependency(&b, &c, DependencyKind::Blocks).await.unwrap();
    let err = accessor.add_dependency(&c, &a, DependencyKind::Blocks).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn parent_child_links_show_on_both_sides() {
    let (_, accessor) = board();
    let epic = create(&accessor, "epic").await;
    let task = create(&accessor, "task").await;
    accessor.add_dependency(&epic, &task, DependencyKind::ParentChild).await.unwrap();

    let child = accessor.get_issue_full(&task).await.unwrap();
    assert_eq!(child.parent.as_ref().map(|p| p.id.as_str()), Some(epic.as_str()));
    assert!(child.card.is_ready);
    let parent = accessor.get_issue_full(&epic).await.unwrap();
    assert_eq!(parent.children.len(), 1);

    accessor.remove_dependency(&epic, &task, DependencyKind::ParentChild).await.unwrap();
    assert!(accessor.get_issue_full(&task).await.unwrap().parent.is_none());
}

#[tokio::test]
async fn board_snapshot_places_every_issue_once() {
    let (_, accessor) = board();
    let ready = create(&accessor, "ready").await;
    let working = create(&accessor, "working").await;
    let waiting = create(&accessor, "waiting").await;
    let done = create(&accessor, "done").await;
    accessor.set_issue_status(&working, "in_progress").await.unwrap();
    accessor.add_dependency(&working, &waiting, DependencyKind::Blocks).await.unwrap();
    accessor.close_issue(&done).await.unwrap();

    let snapshot = accessor.get_board().await.unwrap();
    let ids = |column: BoardColumn| {
        snapshot.column(column).iter().map(|c| c.card.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(BoardColumn::Ready), vec![ready]);
    assert_eq!(ids(BoardColumn::InProgress), vec![working]);
    assert_eq!(ids(BoardColumn::Blocked), vec![waiting]);
    assert_eq!(ids(BoardColumn::Closed), vec![done]);
}

#[tokio::test]
async fn labels_and_delete() {
    let (_, accessor) = board();
    let id = create(&accessor, "labelled").await;
    let other = create(&accessor, "other").await;
    accessor.add_label(&id, "ui").await.unwrap();
    accessor.add_label(&id, "ui").await.unwrap();
    accessor.remove_label(&id, "absent").await.unwrap();
    assert_eq!(accessor.get_issue_full(&id).await.unwrap().labels, vec!["ui".to_string()]);

    accessor.add_dependency(&id, &other, DependencyKind::Blocks).await.unwrap();
    accessor.delete_issue(&id).await.unwrap();
    assert_eq!(accessor.get_issue_full(&id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert!(accessor.get_issue_full(&other).await.unwrap().card.is_ready);
}

#[tokio::test]
async fn counts_stay_exact_for_large_boards() {
    let (_, accessor) = board();
    let total = 2_000;
    for i in 0..total {
        let id = create(&accessor, &format!("bulk {i}")).await;
        if i % 4 == 0 {
            accessor.close_issue(&id).await.unwrap();
        }
    }
    let closed = accessor.get_column_count(BoardColumn::Closed).await.unwrap();
    let ready = accessor.get_column_count(BoardColumn::Ready).await.unwrap();
    assert_eq!(closed, total / 4);
    assert_eq!(ready + closed, total);

    let last = accessor.get_column_data(BoardColumn::Ready, ready - 3, 50).await.unwrap();
    assert_eq!(last.len(), 3);
}
