//! Shell をスプレッドシートストア（メモリ上のシート）の上で動かすシナリオ

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use taskboard_core::app::{Draft, Phase, Shell};
use taskboard_core::domain::{NewTask, Priority, Role, Session, Status, TaskId, User, UserId};
use taskboard_core::impls::{InMemorySheets, SheetTaskStore};
use taskboard_core::ports::{FixedClock, TaskStore};
use taskboard_core::view::{SortDirection, SortKey, TableState, TaskFilter};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn sheets() -> InMemorySheets {
    InMemorySheets::new()
        .with_rows(
            "Users",
            vec![
                row(&["user1@example.com", "Taro Yamada", "admin"]),
                row(&["user2@example.com", "Hanako Suzuki", "member"]),
            ],
        )
        .with_rows(
            "Categories",
            vec![row(&["CAT-1", "デザイン"]), row(&["CAT-2", "バックエンド"])],
        )
        .with_rows(
            "Tasks",
            vec![row(&[
                "TASK-001",
                "UI設計の完了",
                "",
                "user1@example.com",
                "デザイン",
                "2023-10-01",
                "2023-10-05",
                "高",
                "完了",
                "2023-10-01T10:00:00.000Z",
                "2023-10-05T15:00:00.000Z",
            ])],
        )
}

fn shell(sheets: InMemorySheets) -> (Shell, Arc<SheetTaskStore<InMemorySheets>>) {
    let session = Session::new(User::new("user1@example.com", "Taro Yamada", Role::Admin));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
    ));
    let store = Arc::new(SheetTaskStore::new(sheets, session.clone(), clock));
    (Shell::new(store.clone(), session), store)
}

#[tokio::test]
async fn load_edit_move_delete_round_trip() {
    let (shell, store) = shell(sheets());
    shell.load().await.unwrap();
    assert_eq!(shell.phase().await, Phase::Ready);
    assert_eq!(shell.users().await.len(), 2);

    let created = shell
        .save(Draft::New(NewTask {
            name: "APIエンドポイント実装".into(),
            priority: Priority::High,
            ..NewTask::draft(
                UserId::new("user2@example.com"),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            )
        }))
        .await
        .unwrap();

    // 作成したタスクはストアから読み直しても同じ
    let listed = store.list_tasks().await.unwrap();
    assert_eq!(listed.last(), Some(&created));

    let moved = shell
        .move_task(&created.id, Status::InProgress)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.status, Status::InProgress);
    assert_eq!(store.list_tasks().await.unwrap()[1].status, Status::InProgress);

    shell.delete(&TaskId::new("TASK-001")).await.unwrap();
    let remaining = store.list_tasks().await.unwrap();
    assert_eq!(remaining, vec![moved.clone()]);
    assert_eq!(shell.tasks().await, vec![moved]);
}

#[tokio::test]
async fn projections_follow_the_loaded_collection() {
    let (shell, _) = shell(sheets());
    shell.load().await.unwrap();
    shell
        .save(Draft::New(NewTask {
            name: "調査".into(),
            ..NewTask::draft(
                UserId::new("user2@example.com"),
                NaiveDate::from_ymd_opt(2023, 10, 10).unwrap(),
            )
        }))
        .await
        .unwrap();

    let snapshot = shell.snapshot().await;

    let by_name = snapshot.table(
        &TaskFilter::default(),
        &TableState::new(SortKey::Name, SortDirection::Asc),
    );
    assert_eq!(by_name.len(), 2);

    let [todo, _, done] = snapshot.board();
    assert_eq!(todo.len(), 1);
    assert_eq!(done.len(), 1);

    let layout = snapshot.timeline(NaiveDate::from_ymd_opt(2023, 10, 3).unwrap());
    assert_eq!(layout.start, NaiveDate::from_ymd_opt(2023, 9, 29).unwrap());
    assert_eq!(layout.end, NaiveDate::from_ymd_opt(2023, 10, 12).unwrap());
    assert_eq!(layout.today_offset, Some(4));
}

#[tokio::test]
async fn malformed_row_fails_load() {
    let sheets = sheets().with_rows(
        "Users",
        vec![row(&["user1@example.com", "Taro Yamada", "owner"])],
    );
    let (shell, _) = shell(sheets);

    let err = shell.load().await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to load data. Please try again later.");
    assert!(matches!(shell.phase().await, Phase::Error(_)));
}

#[tokio::test]
async fn comments_round_trip_through_the_comments_sheet() {
    let (shell, store) = shell(sheets());
    shell.load().await.unwrap();
    let id = TaskId::new("TASK-001");

    let posted = shell.add_comment(&id, "デザイン確認済み").await.unwrap();

    assert_eq!(store.list_comments(&id).await.unwrap(), vec![posted.clone()]);
    assert_eq!(shell.comments(&id).await.unwrap(), vec![posted]);
}
