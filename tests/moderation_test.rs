mod common;

use serde_json::{json, Value};

async fn suspend(app: &common::TestApp, token: &str, user_id: i32) -> reqwest::StatusCode {
    app.client
        .put(app.url(&format!("/admin/users/{}/suspend", user_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .status()
}

async fn unsuspend(app: &common::TestApp, token: &str, user_id: i32) -> reqwest::StatusCode {
    app.client
        .put(app.url(&format!("/admin/users/{}/unsuspend", user_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn ambassador_suspends_normal_user() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (amb_id, amb_token) = common::create_test_user(&app, "mod_amb_a").await;
    common::make_ambassador(&app.db, amb_id).await;
    let (target_id, target_token) = common::create_test_user(&app, "mod_target_a").await;

    assert_eq!(suspend(&app, &amb_token, target_id).await, 200);

    // The suspended account is shut out of protected routes
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Suspending again is a no-op success
    assert_eq!(suspend(&app, &amb_token, target_id).await, 200);

    assert_eq!(unsuspend(&app, &amb_token, target_id).await, 200);
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn ambassador_cannot_touch_elevated_roles() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (amb_id, amb_token) = common::create_test_user(&app, "mod_amb_b").await;
    common::make_ambassador(&app.db, amb_id).await;

    let (other_amb_id, _) = common::create_test_user(&app, "mod_amb_b2").await;
    common::make_ambassador(&app.db, other_amb_id).await;
    let (admin_id, _) = common::create_test_user(&app, "mod_admin_b").await;
    common::make_admin(&app.db, admin_id).await;

    assert_eq!(suspend(&app, &amb_token, other_amb_id).await, 403);
    assert_eq!(suspend(&app, &amb_token, admin_id).await, 403);
    assert_eq!(unsuspend(&app, &amb_token, admin_id).await, 403);
}

#[tokio::test]
async fn admin_moderates_anyone() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (admin_id, admin_token) = common::create_test_user(&app, "mod_admin_c").await;
    common::make_admin(&app.db, admin_id).await;
    let (amb_id, _) = common::create_test_user(&app, "mod_amb_c").await;
    common::make_ambassador(&app.db, amb_id).await;

    assert_eq!(suspend(&app, &admin_token, amb_id).await, 200);
    assert_eq!(unsuspend(&app, &admin_token, amb_id).await, 200);
}

#[tokio::test]
async fn normal_user_cannot_moderate_or_list() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, user_token) = common::create_test_user(&app, "mod_user_d").await;
    let (target_id, _) = common::create_test_user(&app, "mod_target_d").await;

    assert_eq!(suspend(&app, &user_token, target_id).await, 403);

    let resp = app
        .client
        .get(app.url("/admin/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn ambassador_can_list_users() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (amb_id, amb_token) = common::create_test_user(&app, "mod_amb_e").await;
    common::make_ambassador(&app.db, amb_id).await;

    let resp = app
        .client
        .get(app.url("/admin/users"))
        .bearer_auth(&amb_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["items"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn role_assignment_is_admin_only() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (admin_id, admin_token) = common::create_test_user(&app, "role_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (amb_id, amb_token) = common::create_test_user(&app, "role_amb").await;
    common::make_ambassador(&app.db, amb_id).await;
    let (target_id, _) = common::create_test_user(&app, "role_target").await;

    // Ambassador may not assign roles
    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", target_id)))
        .bearer_auth(&amb_token)
        .json(&json!({"role": "ambassador"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Admin may, but only to known roles
    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", target_id)))
        .bearer_auth(&admin_token)
        .json(&json!({"role": "superuser"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", target_id)))
        .bearer_auth(&admin_token)
        .json(&json!({"role": "ambassador"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "ambassador");
}

#[tokio::test]
async fn suspended_user_cannot_login() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (admin_id, admin_token) = common::create_test_user(&app, "login_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (target_id, target_token) = common::create_test_user(&app, "login_target").await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&target_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let username = body["data"]["username"].as_str().unwrap().to_string();

    assert_eq!(suspend(&app, &admin_token, target_id).await, 200);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({
            "username": username,
            "password": "test_password_123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
