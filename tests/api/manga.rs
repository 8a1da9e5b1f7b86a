use std::sync::Arc;

use chrono::Duration;
use hilaw_client::manga::{ChapterOrder, ResourceError};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::{
    fake::{chapters, comic, hot_chapters, manga_listing},
    helper::{Reply, build_app, spawn_app},
};

const HOT: &str = "GET /manga/chapter/";
const TRENDING: &str = "GET /manga/top";

#[tokio::test]
async fn hot_manga_is_served_from_cache_until_ttl_elapses() {
    let test_app = spawn_app().await;
    test_app
        .backend
        .reply(HOT, Reply::ok(Value::Array(hot_chapters("hot", 5))));
    let store = test_app.app.manga();

    let first = store.fetch_hot_manga(None, false).await.unwrap();
    assert_eq!(first.len(), 5);

    test_app.clock.advance(Duration::minutes(59));
    let second = store.fetch_hot_manga(None, false).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(test_app.backend.hits(HOT), 1);

    test_app.clock.advance(Duration::minutes(1));
    store.fetch_hot_manga(None, false).await.unwrap();
    assert_eq!(test_app.backend.hits(HOT), 2);

    let report = store.stats();
    assert_eq!(report.api_calls, 2);
    assert_eq!(report.cache_hits.hot_manga, 1);
    assert_eq!(report.hit_rate.to_string(), "33%");
}

#[tokio::test]
async fn forced_refresh_always_fetches() {
    let test_app = spawn_app().await;
    test_app
        .backend
        .reply(TRENDING, Reply::ok(Value::Array(manga_listing("top", 3))));
    let store = test_app.app.manga();

    store.fetch_trending(false).await.unwrap();
    store.fetch_trending(true).await.unwrap();
    store.fetch_trending(true).await.unwrap();

    assert_eq!(test_app.backend.hits(TRENDING), 3);
    assert_eq!(store.stats().cache_hits.trending, 0);
}

#[tokio::test]
async fn hot_manga_pages_are_cached_separately() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        HOT,
        Reply::ok(json!({
            "chapters": hot_chapters("hot", 30),
            "pagination": { "total": 95 }
        })),
    );
    let store = test_app.app.manga();

    store.fetch_hot_manga(Some(1), false).await.unwrap();
    store.fetch_hot_manga(Some(2), false).await.unwrap();

    assert_eq!(test_app.backend.hits(HOT), 2);
    assert_eq!(store.current_page(), 2);
    assert_eq!(store.total_pages(), 4);

    let query = test_app.backend.requests_to(HOT)[1].query.clone().unwrap();
    assert!(query.contains("page=2"));
    assert!(query.contains("order=hot"));
    assert!(query.contains("limit=30"));
}

#[tokio::test]
async fn every_trending_shape_yields_the_same_listing() {
    let listing = manga_listing("trend", 40);
    let expected: Vec<String> = listing
        .iter()
        .take(30)
        .map(|item| item["slug"].as_str().unwrap().to_string())
        .collect();

    let shapes = [
        Value::Array(listing.clone()),
        json!({ "180": listing }),
        json!({ "7": listing }),
        json!({ "manga": listing }),
        json!({ "data": listing }),
        json!({ "trending": { "180": listing } }),
        json!({ "trending": { "30": listing } }),
    ];

    for shape in shapes {
        let test_app = spawn_app().await;
        test_app.backend.reply(TRENDING, Reply::ok(shape.clone()));

        let trending = test_app.app.manga().fetch_trending(false).await.unwrap();
        let slugs: Vec<String> = trending
            .iter()
            .map(|manga| manga.slug.clone().unwrap())
            .collect();

        assert_eq!(slugs, expected, "shape {shape:.40}");
    }
}

#[tokio::test]
async fn failed_trending_refresh_keeps_previous_listing() {
    let test_app = spawn_app().await;
    test_app
        .backend
        .reply(TRENDING, Reply::ok(Value::Array(manga_listing("top", 3))));
    let store = test_app.app.manga();
    store.fetch_trending(false).await.unwrap();

    test_app.backend.clear_replies(TRENDING);
    test_app.backend.reply(
        TRENDING,
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR, json!({})),
    );

    let error = store.fetch_trending(true).await.unwrap_err();

    assert!(matches!(error, ResourceError::Failed(_)));
    assert_eq!(store.trending().len(), 3);
    assert_eq!(store.trending_state().error, Some(error));
    assert!(!store.trending_state().loading);
}

#[tokio::test]
async fn manga_info_is_cached_per_slug() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/comic/solo-leveling",
        Reply::ok(comic("solo-leveling", "abc")),
    );
    let store = test_app.app.manga();

    assert!(store.get_manga_info("solo-leveling").is_none());

    let details = store.fetch_manga_info("solo-leveling", false).await.unwrap();
    assert_eq!(details.comic.hid.as_deref(), Some("abc"));
    assert_eq!(details.comic.kind().as_str(), "Manhwa");

    store.fetch_manga_info("solo-leveling", false).await.unwrap();
    assert_eq!(test_app.backend.hits("GET /manga/comic/solo-leveling"), 1);
    assert!(store.get_manga_info("solo-leveling").is_some());

    test_app.clock.advance(Duration::minutes(60));
    assert!(store.get_manga_info("solo-leveling").is_none());
}

#[tokio::test]
async fn missing_manga_is_not_found() {
    let test_app = spawn_app().await;

    let error = test_app
        .app
        .manga()
        .fetch_manga_info("does-not-exist", false)
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::NotFound(_)));
}

#[tokio::test]
async fn chapters_are_cached_per_order() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/comic/abc/chapters",
        Reply::ok(json!({ "chapters": chapters("abc", 12), "total": 12 })),
    );
    let store = test_app.app.manga();

    let descending = store
        .fetch_chapters("abc", ChapterOrder::Descending, false)
        .await
        .unwrap();
    store
        .fetch_chapters("abc", ChapterOrder::Ascending, false)
        .await
        .unwrap();
    store
        .fetch_chapters("abc", ChapterOrder::Descending, false)
        .await
        .unwrap();

    assert_eq!(descending.total, 12);
    assert_eq!(descending.chapters.len(), 12);

    let requests = test_app.backend.requests_to("GET /manga/comic/abc/chapters");
    assert_eq!(requests.len(), 2);
    assert!(requests[0].query.as_deref().unwrap().contains("chap-order=0"));
    assert!(requests[1].query.as_deref().unwrap().contains("chap-order=1"));
    assert!(requests[0].query.as_deref().unwrap().contains("limit=9999"));

    test_app.clock.advance(Duration::minutes(15));
    assert!(store.get_chapters("abc", ChapterOrder::Descending).is_none());
}

#[tokio::test]
async fn manga_without_chapters_is_not_cached() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/comic/empty/chapters",
        Reply::ok(json!({ "chapters": [], "total": 0 })),
    );
    let store = test_app.app.manga();

    for _ in 0..2 {
        let error = store
            .fetch_chapters("empty", ChapterOrder::Descending, false)
            .await
            .unwrap_err();
        assert!(matches!(error, ResourceError::NotFound(_)));
    }

    assert_eq!(test_app.backend.hits("GET /manga/comic/empty/chapters"), 2);
    assert!(store.get_chapters("empty", ChapterOrder::Descending).is_none());
}

#[tokio::test]
async fn cache_survives_a_restart() {
    let test_app = spawn_app().await;
    test_app
        .backend
        .reply(TRENDING, Reply::ok(Value::Array(manga_listing("top", 4))));
    test_app.app.manga().fetch_trending(false).await.unwrap();

    let restarted = build_app(
        &test_app.backend,
        test_app.storage.clone(),
        test_app.clock.clone(),
        |_| {},
    );
    let trending = restarted.manga().fetch_trending(false).await.unwrap();

    assert_eq!(trending.len(), 4);
    assert_eq!(test_app.backend.hits(TRENDING), 1);
    assert_eq!(restarted.manga().stats().api_calls, 1);
    assert_eq!(restarted.manga().stats().cache_hits.trending, 1);
}

#[tokio::test]
async fn clear_cache_forces_the_next_fetch() {
    let test_app = spawn_app().await;
    test_app
        .backend
        .reply(TRENDING, Reply::ok(Value::Array(manga_listing("top", 2))));
    let store = test_app.app.manga();

    store.fetch_trending(false).await.unwrap();
    store.clear_cache();
    store.fetch_trending(false).await.unwrap();

    assert_eq!(test_app.backend.hits(TRENDING), 2);
    assert_eq!(store.stats().api_calls, 2);
}

#[tokio::test]
async fn short_search_makes_no_request() {
    let test_app = spawn_app().await;

    let results = test_app.app.manga().search(" a ", 1, 20).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(test_app.backend.hits("GET /manga/v1.0/search/"), 0);
}

#[tokio::test]
async fn search_sends_the_trimmed_query() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/v1.0/search/",
        Reply::ok(Value::Array(manga_listing("found", 3))),
    );

    let results = test_app.app.manga().search("  one piece ", 1, 20).await.unwrap();

    assert_eq!(results.len(), 3);
    let query = test_app.backend.requests_to("GET /manga/v1.0/search/")[0]
        .query
        .clone()
        .unwrap();
    assert!(query.contains("q=one+piece") || query.contains("q=one%20piece"));
}

#[tokio::test]
async fn chapter_images_become_absolute_urls() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/chapter/c1/get_images",
        Reply::ok(json!([{ "b2key": "p1.jpg" }, { "b2key": "p2.jpg" }])),
    );

    let images = test_app.app.manga().chapter_images("c1").await.unwrap();

    assert_eq!(
        images,
        vec![
            format!("{}/images/p1.jpg", test_app.backend.address),
            format!("{}/images/p2.jpg", test_app.backend.address),
        ]
    );
}

#[tokio::test]
async fn chapter_navigation_reads_neighbours() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /manga/chapter/c2",
        Reply::ok(json!({
            "chapter": { "hid": "c2" },
            "prev": { "hid": "c1" },
            "next": { "hid": "c3" },
        })),
    );

    let navigation = test_app.app.manga().chapter_navigation("c2").await.unwrap();

    assert_eq!(navigation.prev.as_deref(), Some("c1"));
    assert_eq!(navigation.next.as_deref(), Some("c3"));
}
