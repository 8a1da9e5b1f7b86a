use hilaw_client::{
    bookmarks::{BookmarkInput, ReadingStatus},
    notify::Variant,
};
use reqwest::StatusCode;
use serde_json::json;

use crate::{
    fake::{fake_manga_title, fake_user},
    helper::{Reply, TestApp, spawn_app},
};

fn bookmark_input(manga_id: &str) -> BookmarkInput {
    BookmarkInput {
        manga_id: manga_id.to_string(),
        manga_hid: format!("{manga_id}-hid"),
        manga_title: fake_manga_title(),
        manga_slug: format!("{manga_id}-slug"),
        ..Default::default()
    }
}

async fn signed_in_app() -> TestApp {
    let test_app = spawn_app().await;
    test_app.sign_in(&fake_user()).await;
    test_app
}

#[tokio::test]
async fn added_bookmark_is_reported_by_check() {
    let test_app = signed_in_app().await;
    let manager = test_app.app.bookmarks();

    assert!(!manager.check_bookmark("m1").await.is_bookmarked);

    assert!(manager.add_bookmark(bookmark_input("m1")).await);

    let check = manager.check_bookmark("m1").await;
    assert!(check.is_bookmarked);
    assert_eq!(check.bookmark.unwrap().manga_id, "m1");
    assert!(!manager.check_bookmark("m2").await.is_bookmarked);
}

#[tokio::test]
async fn add_fills_in_defaults_and_refetches() {
    let test_app = signed_in_app().await;
    let mut notifications = test_app.app.notifier().subscribe();
    let input = bookmark_input("m1");
    let title = input.manga_title.clone();

    assert!(test_app.app.bookmarks().add_bookmark(input).await);

    let body = test_app.backend.requests_to("POST /api/bookmarks")[0].json();
    assert_eq!(body["manga_country"], "jp");
    assert_eq!(body["manga_status"], 1);

    assert_eq!(test_app.backend.hits("GET /api/bookmarks"), 1);
    let bookmarks = test_app.app.bookmarks().bookmarks();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].manga_title, title);

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.title, "Bookmark added");
    assert_eq!(notification.description, format!("{title} has been bookmarked"));
}

#[tokio::test]
async fn signed_out_user_cannot_bookmark() {
    let test_app = spawn_app().await;
    test_app.app.session().initialize().await;
    let mut notifications = test_app.app.notifier().subscribe();

    assert!(!test_app.app.bookmarks().add_bookmark(bookmark_input("m1")).await);
    assert!(!test_app.app.bookmarks().check_bookmark("m1").await.is_bookmarked);
    assert!(test_app.app.bookmarks().fetch_bookmarks(1, 20).await.is_none());

    assert!(test_app.backend.requests().is_empty());

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.title, "Authentication required");
    assert_eq!(notification.variant, Variant::Destructive);
}

#[tokio::test]
async fn check_reads_failures_as_not_bookmarked() {
    let test_app = signed_in_app().await;
    test_app.backend.reply(
        "GET /api/bookmarks/check/m1",
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" })),
    );

    let check = test_app.app.bookmarks().check_bookmark("m1").await;

    assert!(!check.is_bookmarked);
    assert!(check.bookmark.is_none());
}

#[tokio::test]
async fn check_trusts_the_flag_when_bookmark_data_is_incomplete() {
    let test_app = signed_in_app().await;
    test_app.backend.reply(
        "GET /api/bookmarks/check/m1",
        Reply::ok(json!({
            "success": true,
            "isBookmarked": true,
            "bookmarkData": { "id": "bm-1", "manga_id": "m1" }
        })),
    );

    let check = test_app.app.bookmarks().check_bookmark("m1").await;

    assert!(check.is_bookmarked);
    assert!(check.bookmark.is_none());
}

#[tokio::test]
async fn failed_fetch_is_kept_in_state() {
    let test_app = signed_in_app().await;
    test_app.backend.reply(
        "GET /api/bookmarks",
        Reply::status(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "message": "Database unavailable" }),
        ),
    );
    let mut notifications = test_app.app.notifier().subscribe();

    assert!(test_app.app.bookmarks().fetch_bookmarks(1, 20).await.is_none());

    let state = test_app.app.bookmarks().state();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Database unavailable"));
    assert_eq!(
        notifications.try_recv().unwrap().description,
        "Database unavailable"
    );
}

#[tokio::test]
async fn reading_status_update_reports_previous_value() {
    let test_app = signed_in_app().await;
    let manager = test_app.app.bookmarks();
    manager.add_bookmark(bookmark_input("m1")).await;
    let id = manager.bookmarks()[0].id.clone();

    let update = manager
        .update_reading_status(&id, ReadingStatus::Reading, true)
        .await;

    assert!(update.success);
    assert_eq!(update.previous, Some(ReadingStatus::PlanToRead));
    assert_eq!(manager.bookmarks()[0].reading_status, Some(ReadingStatus::Reading));

    let body = test_app.backend.requests_to(&format!("PUT /api/bookmarks/{id}/progress"))[0].json();
    assert_eq!(body, json!({ "reading_status": "reading" }));

    // patched locally, no reload
    assert_eq!(test_app.backend.hits("GET /api/bookmarks"), 1);
}

#[tokio::test]
async fn failed_reading_status_update_keeps_previous_for_rollback() {
    let test_app = signed_in_app().await;
    let manager = test_app.app.bookmarks();
    manager.add_bookmark(bookmark_input("m1")).await;
    let id = manager.bookmarks()[0].id.clone();
    test_app.backend.reply(
        &format!("PUT /api/bookmarks/{id}/progress"),
        Reply::status(StatusCode::BAD_REQUEST, json!({ "message": "Invalid status" })),
    );
    let mut notifications = test_app.app.notifier().subscribe();

    let update = manager
        .update_reading_status(&id, ReadingStatus::Completed, false)
        .await;

    assert!(!update.success);
    assert_eq!(update.previous, Some(ReadingStatus::PlanToRead));
    assert_eq!(
        manager.bookmarks()[0].reading_status,
        Some(ReadingStatus::PlanToRead)
    );

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.variant, Variant::Destructive);
    assert_eq!(notification.description, "Invalid status");
}

#[tokio::test]
async fn reading_progress_is_recorded() {
    let test_app = signed_in_app().await;
    let manager = test_app.app.bookmarks();
    manager.add_bookmark(bookmark_input("m1")).await;
    let id = manager.bookmarks()[0].id.clone();

    assert!(manager.update_reading_progress(&id, "12", "c12").await);

    let bookmark = &manager.bookmarks()[0];
    assert_eq!(bookmark.last_read_chapter.as_deref(), Some("12"));
    assert_eq!(bookmark.last_read_chapter_hid.as_deref(), Some("c12"));
}

#[tokio::test]
async fn removed_bookmark_disappears_from_listing() {
    let test_app = signed_in_app().await;
    let manager = test_app.app.bookmarks();
    manager.add_bookmark(bookmark_input("m1")).await;
    manager.add_bookmark(bookmark_input("m2")).await;
    let id = manager.bookmarks()[0].id.clone();

    assert!(manager.remove_bookmark(&id, Some("First")).await);

    let remaining = manager.bookmarks();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].manga_id, "m2");
    assert!(!manager.check_bookmark("m1").await.is_bookmarked);

    assert!(!manager.remove_bookmark(&id, None).await);
}
