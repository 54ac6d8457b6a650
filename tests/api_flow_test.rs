// End-to-end flows against a real PostgreSQL database.
// Each test returns early when DATABASE_URL is not set.

use axum::http::StatusCode;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use linkshelf_backend::schema::{
    discussion_messages, folder_discussions, folder_followers, folders, links, users,
};
use serde_json::{json, Value};
use serial_test::serial;

mod common;
use common::{setup_db_app, setup_db_app_with, spawn_page_server, unique_email, TestApp};

const PAGE: &str = r#"<html><head>
<title>Plain title</title>
<meta property="og:title" content="Shelf test page">
<meta property="og:image" content="/img/cover.png">
</head><body>hello</body></html>"#;

async fn create_folder(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .post("/api/folders")
        .bearer(token)
        .json(&body)
        .send()
        .await;
    let status = response.status();
    (status, response.json().await)
}

#[tokio::test]
#[serial]
async fn test_duplicate_email_conflicts() {
    let Some(app) = setup_db_app().await else {
        return;
    };

    let email = unique_email("dup");
    let body = json!({ "name": "Dup", "email": email, "password": "pw-123456" });

    let first = app.post("/api/users").json(&body).send().await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let created: Value = first.json().await;
    assert_eq!(created["success"], true);
    assert!(created["data"].get("passwordHash").is_none());

    // Same address with different case and padding is still the same account
    let shouted = json!({
        "name": "Dup",
        "email": format!("  {}  ", email.to_uppercase()),
        "password": "pw"
    });
    let second = app.post("/api/users").json(&shouted).send().await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[serial]
async fn test_login_checks_password_and_issues_verifiable_token() {
    let Some(app) = setup_db_app().await else {
        return;
    };

    let email = unique_email("login");
    let created = app
        .post("/api/users")
        .json(&json!({ "name": "Login", "email": email, "password": "right-password" }))
        .send()
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let wrong = app
        .post("/api/users/login")
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = app
        .post("/api/users/login")
        .json(&json!({ "email": unique_email("nobody"), "password": "x" }))
        .send()
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let body: Value = unknown.json().await;
    assert_eq!(body["message"], "No user found with this email");

    let ok = app
        .post("/api/users/login")
        .json(&json!({ "email": email, "password": "right-password" }))
        .send()
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    let body: Value = ok.json().await;

    let token = body["token"].as_str().unwrap();
    let claims = app.state.jwt_service.validate_session_token(token).unwrap();
    assert_eq!(claims.email, email);
    assert_eq!(claims.sub, body["data"]["id"].as_i64().unwrap().to_string());

    let me = app.get("/api/users/me").bearer(token).send().await;
    assert_eq!(me.status(), StatusCode::OK);
    let me: Value = me.json().await;
    assert_eq!(me["data"]["email"], email.as_str());
    assert!(me["data"]["folders"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_folder_names_are_unique_per_owner() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, alice) = app.register_and_login("Alice").await;
    let (_, bob) = app.register_and_login("Bob").await;

    let (status, _) = create_folder(&app, &alice, json!({ "folderName": "Reading" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = create_folder(&app, &alice, json!({ "folderName": "  Reading " })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = create_folder(&app, &bob, json!({ "folderName": "Reading" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = create_folder(&app, &bob, json!({ "folderName": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_list_folders_by_tag_and_publish_flag() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, token) = app.register_and_login("Tagger").await;

    let (status, folder) = create_folder(
        &app,
        &token,
        json!({
            "folderName": "Feeds",
            "folderTags": ["tech", " news ", "tech", ""],
            "isPublishable": "true"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(folder["data"]["folderTags"], json!(["tech", "news"]));
    // Only the JSON literal true publishes
    assert_eq!(folder["data"]["isPublishable"], false);

    let news: Value = app
        .get("/api/folders?tag=news")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(news["data"].as_array().unwrap().len(), 1);
    assert_eq!(news["data"][0]["folderName"], "Feeds");
    assert_eq!(news["data"][0]["counts"]["links"], 0);

    let sports: Value = app
        .get("/api/folders?tag=sports")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert!(sports["data"].as_array().unwrap().is_empty());

    let by_name: Value = app
        .get("/api/folders?folderName=fee")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(by_name["data"].as_array().unwrap().len(), 1);

    let published: Value = app
        .get("/api/folders?isPublishable=true")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert!(published["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_patching_another_users_folder_is_forbidden() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, owner) = app.register_and_login("Owner").await;
    let (_, intruder) = app.register_and_login("Intruder").await;

    let (_, folder) = create_folder(&app, &owner, json!({ "folderName": "Private" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/folders/folder/{}", folder_id);

    let response = app
        .patch(&uri)
        .bearer(&intruder)
        .json(&json!({ "folderName": "Hijacked" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Not publishable, so the intruder cannot read it either
    let response = app.get(&uri).bearer(&intruder).send().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let detail: Value = app.get(&uri).bearer(&owner).send().await.json().await;
    assert_eq!(detail["data"]["folderName"], "Private");
}

#[tokio::test]
#[serial]
async fn test_owner_can_retag_folder_and_list_by_new_tag() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, token) = app.register_and_login("Retagger").await;

    let (_, folder) = create_folder(&app, &token, json!({ "folderName": "Untagged" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap();
    assert_eq!(folder["data"]["folderTags"], json!([]));

    let response = app
        .patch(&format!("/api/folders/folder/{}", folder_id))
        .bearer(&token)
        .json(&json!({ "folderTags": ["tech", "news"], "isPublishable": true }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await;
    assert_eq!(updated["data"]["folderTags"], json!(["tech", "news"]));
    assert_eq!(updated["data"]["isPublishable"], true);

    let news: Value = app
        .get("/api/folders?tag=news")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    let news = news["data"].as_array().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0]["id"].as_i64(), Some(folder_id));

    let sports: Value = app
        .get("/api/folders?tag=sports")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(sports["data"].as_array().unwrap().len(), 0);

    let published: Value = app
        .get("/api/folders?isPublishable=true")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(published["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_deleting_folder_is_owner_only_and_cascades() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (owner_id, owner) = app.register_and_login("Archivist").await;
    let (stranger_id, stranger) = app.register_and_login("Passerby").await;
    let page_url = spawn_page_server(PAGE).await;

    let (_, folder) = create_folder(&app, &owner, json!({ "folderName": "Doomed" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap() as i32;
    let uri = format!("/api/folders/folder/{}", folder_id);

    let response = app
        .post(&format!("/api/links/{}", folder_id))
        .bearer(&owner)
        .json(&json!({ "url": page_url }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut conn = app.state.diesel_pool.get().await.unwrap();

    let discussion_id: i32 = diesel::insert_into(folder_discussions::table)
        .values((
            folder_discussions::folder_id.eq(folder_id),
            folder_discussions::name.eq("General"),
        ))
        .returning(folder_discussions::id)
        .get_result(&mut conn)
        .await
        .unwrap();
    diesel::insert_into(discussion_messages::table)
        .values((
            discussion_messages::discussion_id.eq(discussion_id),
            discussion_messages::user_id.eq(owner_id as i32),
            discussion_messages::content.eq("first post"),
        ))
        .execute(&mut conn)
        .await
        .unwrap();
    diesel::insert_into(folder_followers::table)
        .values((
            folder_followers::folder_id.eq(folder_id),
            folder_followers::user_id.eq(stranger_id as i32),
        ))
        .execute(&mut conn)
        .await
        .unwrap();

    // Following grants read access, never delete
    let response = app.delete(&uri).bearer(&stranger).send().await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.get(&uri).bearer(&owner).send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.delete(&uri).bearer(&owner).send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&uri).bearer(&owner).send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let remaining_folders: i64 = folders::table
        .find(folder_id)
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_folders, 0);

    let remaining_links: i64 = links::table
        .filter(links::folder_id.eq(folder_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_links, 0);

    let remaining_discussions: i64 = folder_discussions::table
        .filter(folder_discussions::folder_id.eq(folder_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_discussions, 0);

    let remaining_messages: i64 = discussion_messages::table
        .filter(discussion_messages::discussion_id.eq(discussion_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_messages, 0);

    let remaining_followers: i64 = folder_followers::table
        .filter(folder_followers::folder_id.eq(folder_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_followers, 0);
}

#[tokio::test]
#[serial]
async fn test_private_link_targets_are_refused_by_default() {
    let Some(app) = setup_db_app_with(|_| {}).await else {
        return;
    };
    let (_, token) = app.register_and_login("Guarded").await;
    let (_, folder) = create_folder(&app, &token, json!({ "folderName": "Intranet" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap();

    let page_url = spawn_page_server(PAGE).await;
    for url in [
        page_url.as_str(),
        "http://localhost/admin",
        "http://169.254.169.254/latest/meta-data/",
    ] {
        let response = app
            .post(&format!("/api/links/{}", folder_id))
            .bearer(&token)
            .json(&json!({ "url": url }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", url);
    }

    let listed: Value = app
        .get(&format!("/api/links?folderId={}", folder_id))
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert!(listed["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_create_link_scrapes_metadata() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, token) = app.register_and_login("Linker").await;
    let (_, folder) = create_folder(&app, &token, json!({ "folderName": "Links" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap();

    let page_url = spawn_page_server(PAGE).await;

    let response = app
        .post(&format!("/api/links/{}", folder_id))
        .bearer(&token)
        .json(&json!({ "url": page_url, "summary": "A page", "tags": ["rust", "rust"] }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await;
    let link = &body["data"];

    assert_eq!(link["title"], "Shelf test page");
    assert!(link["imageUrl"].as_str().unwrap().ends_with("/img/cover.png"));
    assert_eq!(link["domain"], "127.0.0.1");
    assert_eq!(link["tags"], json!(["rust"]));
    assert_eq!(link["isOnline"], false);
    assert_eq!(link["pingIntervalMs"], 3000);

    let link_id = link["id"].as_i64().unwrap();
    let fetched = app
        .get(&format!("/api/links/{}", link_id))
        .bearer(&token)
        .send()
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let listed: Value = app
        .get(&format!("/api/links?folderId={}", folder_id))
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    // Another user cannot see or add to it
    let (_, stranger) = app.register_and_login("Stranger").await;
    let hidden = app
        .get(&format!("/api/links/{}", link_id))
        .bearer(&stranger)
        .send()
        .await;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let blocked = app
        .post(&format!("/api/links/{}", folder_id))
        .bearer(&stranger)
        .json(&json!({ "url": page_url }))
        .send()
        .await;
    assert_eq!(blocked.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[serial]
async fn test_unreachable_link_reports_url() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (_, token) = app.register_and_login("Offline").await;
    let (_, folder) = create_folder(&app, &token, json!({ "folderName": "Dead ends" })).await;
    let folder_id = folder["data"]["id"].as_i64().unwrap();

    let response = app
        .post(&format!("/api/links/{}", folder_id))
        .bearer(&token)
        .json(&json!({ "url": "http://127.0.0.1:9/nothing" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await;
    assert_eq!(body["success"], false);
    assert_eq!(body["url"], "http://127.0.0.1:9/nothing");

    let response = app
        .post(&format!("/api/links/{}", folder_id))
        .bearer(&token)
        .json(&json!({ "url": "not a url" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_deleting_user_removes_everything_they_own() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (user_id, token) = app.register_and_login("Leaver").await;
    let user_id = user_id as i32;
    let page_url = spawn_page_server(PAGE).await;

    let mut conn = app.state.diesel_pool.get().await.unwrap();

    for name in ["First", "Second"] {
        let (_, folder) = create_folder(&app, &token, json!({ "folderName": name })).await;
        let folder_id = folder["data"]["id"].as_i64().unwrap() as i32;

        let response = app
            .post(&format!("/api/links/{}", folder_id))
            .bearer(&token)
            .json(&json!({ "url": page_url }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let discussion_id: i32 = diesel::insert_into(folder_discussions::table)
            .values((
                folder_discussions::folder_id.eq(folder_id),
                folder_discussions::name.eq("General"),
            ))
            .returning(folder_discussions::id)
            .get_result(&mut conn)
            .await
            .unwrap();

        diesel::insert_into(discussion_messages::table)
            .values((
                discussion_messages::discussion_id.eq(discussion_id),
                discussion_messages::user_id.eq(user_id),
                discussion_messages::content.eq("hello"),
            ))
            .execute(&mut conn)
            .await
            .unwrap();
    }

    let me: Value = app
        .get("/api/users/me")
        .bearer(&token)
        .send()
        .await
        .json()
        .await;
    let folders_json = me["data"]["folders"].as_array().unwrap();
    assert_eq!(folders_json.len(), 2);
    assert_eq!(folders_json[0]["counts"]["links"], 1);
    assert_eq!(folders_json[0]["counts"]["discussions"], 1);

    let response = app.delete("/api/users/me").bearer(&token).send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let remaining_folders: i64 = folders::table
        .filter(folders::user_id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_folders, 0);

    let remaining_links: i64 = links::table
        .inner_join(folders::table)
        .filter(folders::user_id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_links, 0);

    let remaining_messages: i64 = discussion_messages::table
        .filter(discussion_messages::user_id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_messages, 0);

    let remaining_users: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(remaining_users, 0);

    // The token is still well-formed but now points at nobody
    let response = app.get("/api/users/me").bearer(&token).send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_update_profile_replaces_social_links() {
    let Some(app) = setup_db_app().await else {
        return;
    };
    let (user_id, token) = app.register_and_login("Updater").await;

    let response = app
        .patch("/api/users/me")
        .bearer(&token)
        .json(&json!({
            "bio": "Collects links",
            "socialLinks": { "github": "https://github.com/updater" }
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .patch("/api/users/me")
        .bearer(&token)
        .json(&json!({
            "bio": null,
            "socialLinks": { "mastodon": "https://social.example/@updater" }
        }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await;
    assert!(body["data"]["bio"].is_null());
    let socials = body["data"]["socialLinks"].as_array().unwrap();
    assert_eq!(socials.len(), 1);
    assert_eq!(socials[0]["platform"], "mastodon");

    // Public view of the same user hides the email
    let (_, viewer) = app.register_and_login("Viewer").await;
    let public: Value = app
        .get(&format!("/api/users/user/{}", user_id))
        .bearer(&viewer)
        .send()
        .await
        .json()
        .await;
    assert_eq!(public["data"]["name"], "Updater");
    assert!(public["data"].get("email").is_none());
}
