use chrono::Duration;
use hilaw_client::{
    clock::Clock,
    profile::{ProfileError, ProfileImage, ProfileStats, ProfileUpdate, StatsPatch},
};
use reqwest::StatusCode;
use serde_json::json;

use crate::{
    fake::{fake_user, user_json},
    helper::{Reply, spawn_app},
};

const PROFILE: &str = "GET /api/profile";

#[tokio::test]
async fn profile_is_served_from_cache_for_thirty_minutes() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&user) } })),
    );
    let store = test_app.app.profile();

    store.load_profile(Some(&user), false).await.unwrap();
    test_app.clock.advance(Duration::minutes(29));
    store.load_profile(Some(&user), false).await.unwrap();
    assert_eq!(test_app.backend.hits(PROFILE), 1);

    test_app.clock.advance(Duration::minutes(1));
    store.load_profile(Some(&user), false).await.unwrap();
    assert_eq!(test_app.backend.hits(PROFILE), 2);

    store.load_profile(Some(&user), true).await.unwrap();
    assert_eq!(test_app.backend.hits(PROFILE), 3);

    let report = store.cache_report();
    assert_eq!(report.api_calls, 3);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.hit_rate.to_string(), "25%");
    assert_eq!(report.last_fetched, Some(test_app.clock.now()));
}

#[tokio::test]
async fn switching_users_discards_the_previous_profile() {
    let test_app = spawn_app().await;
    let mut first = fake_user();
    first.bio = Some("Reads everything".to_string());
    let second = fake_user();
    test_app.sign_in(&first).await;

    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&first) } })),
    );
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&second) } })),
    );
    let store = test_app.app.profile();

    store.load_profile(Some(&first), false).await.unwrap();
    assert_eq!(store.bio(), "Reads everything");
    store.set_bio("half-written bio");
    store.set_stats(StatsPatch {
        favorites: Some(7),
        ..Default::default()
    });

    let loaded = store.load_profile(Some(&second), false).await.unwrap();

    assert_eq!(loaded.id, second.id);
    assert_eq!(store.profile().unwrap().id, second.id);
    assert_eq!(store.bio(), "");
    assert_eq!(store.original_bio(), "");
    assert_eq!(store.stats(), ProfileStats::default());
    assert_eq!(test_app.backend.hits(PROFILE), 2);
}

#[tokio::test]
async fn failed_fetch_falls_back_to_session_identity() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.backend.reply(
        PROFILE,
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" })),
    );
    let store = test_app.app.profile();

    let loaded = store.load_profile(Some(&user), false).await.unwrap();

    assert_eq!(loaded, user);
    assert_eq!(store.cache_report().last_fetched, None);

    store.load_profile(Some(&user), false).await;
    assert_eq!(test_app.backend.hits(PROFILE), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_the_cached_profile() {
    let test_app = spawn_app().await;
    let mut user = fake_user();
    test_app.sign_in(&user).await;
    user.bio = Some("Cached bio".to_string());
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&user) } })),
    );
    test_app.backend.reply(
        PROFILE,
        Reply::status(StatusCode::BAD_GATEWAY, json!({})),
    );
    let store = test_app.app.profile();

    store.load_profile(Some(&user), false).await.unwrap();
    let loaded = store.load_profile(Some(&user), true).await.unwrap();

    assert_eq!(loaded.bio.as_deref(), Some("Cached bio"));
    assert_eq!(store.bio(), "Cached bio");
}

#[tokio::test]
async fn loading_without_a_user_clears_the_cache() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&user) } })),
    );
    let store = test_app.app.profile();
    store.load_profile(Some(&user), false).await.unwrap();

    assert!(store.load_profile(None, false).await.is_none());
    assert!(store.profile().is_none());
    assert_eq!(test_app.backend.hits(PROFILE), 1);
}

#[tokio::test]
async fn successful_update_replaces_the_cached_profile() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.app.profile().initialize_from_auth(Some(&user));

    let mut updated = user.clone();
    updated.username = "new-name".to_string();
    updated.bio = Some("Hello".to_string());
    test_app.backend.reply(
        "PUT /api/profile",
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&updated) } })),
    );

    let saved = test_app
        .app
        .profile()
        .update_profile(ProfileUpdate {
            username: "new-name".to_string(),
            bio: Some("Hello".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(saved, updated);
    assert_eq!(test_app.app.profile().profile(), Some(updated));
    assert_eq!(test_app.app.profile().original_bio(), "Hello");

    let body = test_app.backend.requests_to("PUT /api/profile")[0].json();
    assert_eq!(body, json!({ "username": "new-name", "bio": "Hello" }));

    // freshly written, so no fetch needed
    test_app.app.profile().load_profile(Some(&user), false).await;
    assert_eq!(test_app.backend.hits(PROFILE), 0);
}

#[tokio::test]
async fn failed_update_leaves_the_cache_untouched() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.app.profile().initialize_from_auth(Some(&user));
    test_app.backend.reply(
        "PUT /api/profile",
        Reply::status(
            StatusCode::CONFLICT,
            json!({ "success": false, "message": "Username taken" }),
        ),
    );

    let error = test_app
        .app
        .profile()
        .update_profile(ProfileUpdate {
            username: "taken".to_string(),
            bio: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(error, ProfileError::Http(ref e) if e.server_message() == Some("Username taken")));
    assert_eq!(test_app.app.profile().profile(), Some(user));
}

#[tokio::test]
async fn invalid_update_is_rejected_locally() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.app.profile().initialize_from_auth(Some(&user));

    let error = test_app
        .app
        .profile()
        .update_profile(ProfileUpdate {
            username: "ab".to_string(),
            bio: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(error, ProfileError::Validation(_)));
    assert_eq!(test_app.backend.hits("PUT /api/profile"), 0);
}

#[tokio::test]
async fn update_requires_a_loaded_profile() {
    let test_app = spawn_app().await;

    let error = test_app
        .app
        .profile()
        .update_profile(ProfileUpdate {
            username: "reader".to_string(),
            bio: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(error, ProfileError::NotLoaded));
}

#[tokio::test]
async fn uploaded_image_is_sent_as_multipart() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.app.profile().initialize_from_auth(Some(&user));

    let mut with_avatar = user.clone();
    with_avatar.avatar_url = Some("https://cdn.example.com/a.png".to_string());
    test_app.backend.reply(
        "POST /api/profile/upload-image",
        Reply::ok(json!({
            "success": true,
            "data": {
                "avatar_url": "https://cdn.example.com/a.png",
                "profile": user_json(&with_avatar),
            }
        })),
    );

    let upload = test_app
        .app
        .profile()
        .upload_profile_image(ProfileImage {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        })
        .await
        .unwrap();

    assert_eq!(upload.avatar_url, "https://cdn.example.com/a.png");
    assert_eq!(test_app.app.profile().profile(), Some(with_avatar));

    let request = &test_app.backend.requests_to("POST /api/profile/upload-image")[0];
    assert!(
        request
            .header("content-type")
            .is_some_and(|value| value.starts_with("multipart/form-data"))
    );
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"image\""));
    assert!(body.contains("filename=\"a.png\""));
}

#[tokio::test]
async fn deleted_image_clears_the_avatar() {
    let test_app = spawn_app().await;
    let mut user = fake_user();
    user.avatar_url = Some("https://cdn.example.com/a.png".to_string());
    test_app.sign_in(&user).await;
    test_app.app.profile().initialize_from_auth(Some(&user));

    let mut without_avatar = user.clone();
    without_avatar.avatar_url = None;
    test_app.backend.reply(
        "DELETE /api/profile/delete-image",
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&without_avatar) } })),
    );

    let profile = test_app.app.profile().delete_profile_image().await.unwrap();

    assert!(profile.avatar_url.is_none());
    assert_eq!(test_app.app.profile().profile(), Some(without_avatar));
}

#[tokio::test]
async fn edit_state_can_be_reset() {
    let test_app = spawn_app().await;
    let mut user = fake_user();
    user.bio = Some("Original".to_string());
    test_app.sign_in(&user).await;
    let store = test_app.app.profile();
    store.initialize_from_auth(Some(&user));

    store.set_bio("Draft");
    assert_eq!(store.bio(), "Draft");
    assert_eq!(store.original_bio(), "Original");

    store.reset_edit_state();
    assert_eq!(store.bio(), "Original");
}

#[tokio::test]
async fn application_initialize_loads_the_signed_in_profile() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&user) } })),
    );

    test_app.app.initialize().await;

    assert_eq!(test_app.app.profile().profile(), Some(user));
    assert_eq!(test_app.backend.hits(PROFILE), 1);
}

#[tokio::test]
async fn cache_hits_reach_storage_on_flush() {
    let test_app = spawn_app().await;
    let user = fake_user();
    test_app.sign_in(&user).await;
    test_app.backend.reply(
        PROFILE,
        Reply::ok(json!({ "success": true, "data": { "profile": user_json(&user) } })),
    );
    let store = test_app.app.profile();

    store.load_profile(Some(&user), false).await.unwrap();
    let written = test_app.raw_storage("profile-storage").unwrap();

    store.load_profile(Some(&user), false).await.unwrap();
    assert_eq!(test_app.raw_storage("profile-storage").unwrap(), written);

    store.flush();
    let flushed: serde_json::Value =
        serde_json::from_str(&test_app.raw_storage("profile-storage").unwrap()).unwrap();
    assert_eq!(flushed["cache_hits"], 1);
}
