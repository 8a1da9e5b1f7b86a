use hilaw_client::{auth::LoginCredentials, configuration::AuthMode};
use serde_json::json;

use crate::{
    fake::{fake_user, user_json},
    helper::{Reply, spawn_app, spawn_app_with},
};

#[tokio::test]
async fn valid_token_is_sent_as_bearer() {
    let test_app = spawn_app().await;
    let token = test_app.sign_in(&fake_user()).await;

    test_app.app.bookmarks().fetch_bookmarks(1, 20).await.unwrap();

    let request = &test_app.backend.requests_to("GET /api/bookmarks")[0];
    assert_eq!(
        request.header("authorization"),
        Some(format!("Bearer {token}").as_str())
    );
    assert_eq!(request.query.as_deref(), Some("page=1&limit=20"));
}

#[tokio::test]
async fn expired_token_is_not_sent() {
    let test_app = spawn_app().await;
    test_app.sign_in(&fake_user()).await;
    test_app.backend.reply(
        "GET /api/comments/manga/m1/chapter/c1",
        Reply::ok(json!({ "success": true, "data": [] })),
    );

    test_app.clock.advance(chrono::Duration::hours(2));
    test_app.app.comments().list("m1", "c1").await;

    let request = &test_app.backend.requests_to("GET /api/comments/manga/m1/chapter/c1")[0];
    assert!(request.header("authorization").is_none());
}

#[tokio::test]
async fn every_request_carries_a_request_id() {
    let test_app = spawn_app().await;
    test_app.backend.reply(
        "GET /api/comments/manga/m1/chapter/c1",
        Reply::ok(json!({ "success": true, "data": [] })),
    );

    test_app.app.comments().list("m1", "c1").await;
    test_app.app.comments().list("m1", "c1").await;

    let ids: Vec<String> = test_app
        .backend
        .requests()
        .iter()
        .map(|request| request.header("x-request-id").unwrap().to_string())
        .collect();

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    for id in ids {
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}

#[tokio::test]
async fn cookie_mode_relies_on_the_session_cookie() {
    let test_app = spawn_app_with(|config| config.backend.auth_mode = AuthMode::Cookie).await;
    let user = fake_user();
    test_app.backend.reply(
        "POST /api/auth/login",
        Reply::ok(json!({ "success": true, "data": { "user": user_json(&user) } }))
            .with_header("set-cookie", "sid=abc123; Path=/; HttpOnly"),
    );
    test_app.backend.reply(
        "GET /api/auth/me",
        Reply::ok(json!({ "success": true, "data": { "user": user_json(&user) } })),
    );

    test_app
        .app
        .session()
        .login(LoginCredentials::new(user.email.clone(), "secret123"))
        .await
        .unwrap();

    let session = test_app.app.session().snapshot();
    assert!(session.is_authenticated);
    assert!(session.token.is_none());
    assert!(test_app.raw_storage("manga-hilaw-token").is_none());

    test_app.app.session().check_session().await.unwrap();

    let check = &test_app.backend.requests_to("GET /api/auth/me")[0];
    assert!(check.header("cookie").is_some_and(|cookie| cookie.contains("sid=abc123")));
    assert!(check.header("authorization").is_none());
}

#[tokio::test]
async fn cookie_session_is_restored_through_the_session_check() {
    let test_app = spawn_app_with(|config| config.backend.auth_mode = AuthMode::Cookie).await;
    let user = fake_user();
    test_app.app.credentials().set_user(&user);
    test_app.backend.reply(
        "GET /api/auth/me",
        Reply::ok(json!({ "success": true, "data": { "user": user_json(&user) } })),
    );

    let session = test_app.app.session().initialize().await;

    assert!(session.is_authenticated);
    assert_eq!(session.user, Some(user));
    assert_eq!(test_app.backend.hits("GET /api/auth/me"), 1);
}
