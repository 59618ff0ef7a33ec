mod common;

use serde_json::{json, Value};

async fn cast(
    app: &common::TestApp,
    token: &str,
    alert_id: i32,
    value: i16,
) -> (reqwest::StatusCode, Value) {
    let resp = app
        .client
        .post(app.url(&format!("/alerts/{}/vote", alert_id)))
        .bearer_auth(token)
        .json(&json!({ "value": value }))
        .send()
        .await
        .unwrap();
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn upvote_updates_alert_and_owner_counters() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_a").await;
    let (_, voter_token) = common::create_test_user(&app, "voter_a").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Upvote fixture", json!({})).await;
    let owner_name = {
        let detail = common::get_alert_detail(&app, &owner_token, alert_id).await;
        detail["data"]["reported_by"].as_str().unwrap().to_string()
    };

    let (status, body) = cast(&app, &voter_token, alert_id, 1).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["value"], 1);
    assert_eq!(body["data"]["positive_votes"], 1);
    assert_eq!(body["data"]["negative_votes"], 0);

    let profile = common::get_profile(&app, &owner_name).await;
    assert_eq!(profile["data"]["alerts_upvoted"], 1);
}

#[tokio::test]
async fn repeated_upvote_retracts_back_to_baseline() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_b").await;
    let (_, voter_token) = common::create_test_user(&app, "voter_b").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Retract fixture", json!({})).await;
    let owner_name = {
        let detail = common::get_alert_detail(&app, &owner_token, alert_id).await;
        detail["data"]["reported_by"].as_str().unwrap().to_string()
    };

    let _ = cast(&app, &voter_token, alert_id, 1).await;
    let (status, body) = cast(&app, &voter_token, alert_id, 1).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["value"], 0);
    assert_eq!(body["data"]["positive_votes"], 0);
    assert_eq!(body["data"]["negative_votes"], 0);

    let profile = common::get_profile(&app, &owner_name).await;
    assert_eq!(profile["data"]["alerts_upvoted"], 0);

    // The vote row is gone: the detail view reports no standing vote
    let detail = common::get_alert_detail(&app, &voter_token, alert_id).await;
    assert!(detail["data"]["user_vote"].is_null());
}

#[tokio::test]
async fn switching_vote_moves_both_counters() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_c").await;
    let (_, voter_token) = common::create_test_user(&app, "voter_c").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Switch fixture", json!({})).await;
    let owner_name = {
        let detail = common::get_alert_detail(&app, &owner_token, alert_id).await;
        detail["data"]["reported_by"].as_str().unwrap().to_string()
    };

    let _ = cast(&app, &voter_token, alert_id, 1).await;
    let (status, body) = cast(&app, &voter_token, alert_id, -1).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["value"], -1);
    assert_eq!(body["data"]["positive_votes"], 0);
    assert_eq!(body["data"]["negative_votes"], 1);

    // Owner lost the received upvote when the voter switched sides
    let profile = common::get_profile(&app, &owner_name).await;
    assert_eq!(profile["data"]["alerts_upvoted"], 0);

    let detail = common::get_alert_detail(&app, &voter_token, alert_id).await;
    assert_eq!(detail["data"]["user_vote"], -1);
}

#[tokio::test]
async fn downvote_never_touches_owner_tally() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_d").await;
    let (_, voter_token) = common::create_test_user(&app, "voter_d").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Downvote fixture", json!({})).await;
    let owner_name = {
        let detail = common::get_alert_detail(&app, &owner_token, alert_id).await;
        detail["data"]["reported_by"].as_str().unwrap().to_string()
    };

    let (_, body) = cast(&app, &voter_token, alert_id, -1).await;
    assert_eq!(body["data"]["negative_votes"], 1);
    let profile = common::get_profile(&app, &owner_name).await;
    assert_eq!(profile["data"]["alerts_upvoted"], 0);

    // Retract the downvote; owner tally still untouched
    let (_, body) = cast(&app, &voter_token, alert_id, -1).await;
    assert_eq!(body["data"]["value"], 0);
    assert_eq!(body["data"]["negative_votes"], 0);
    let profile = common::get_profile(&app, &owner_name).await;
    assert_eq!(profile["data"]["alerts_upvoted"], 0);
}

#[tokio::test]
async fn two_voters_accumulate_independently() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_e").await;
    let (_, first_token) = common::create_test_user(&app, "voter_e1").await;
    let (_, second_token) = common::create_test_user(&app, "voter_e2").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Two voter fixture", json!({})).await;

    let _ = cast(&app, &first_token, alert_id, 1).await;
    let (_, body) = cast(&app, &second_token, alert_id, 1).await;
    assert_eq!(body["data"]["positive_votes"], 2);

    // First voter retracting leaves the second voter's row intact
    let (_, body) = cast(&app, &first_token, alert_id, 1).await;
    assert_eq!(body["data"]["positive_votes"], 1);
}

#[tokio::test]
async fn invalid_vote_value_rejected() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vote_owner_f").await;
    let (_, voter_token) = common::create_test_user(&app, "voter_f").await;

    let alert_id =
        common::create_test_alert(&app, &owner_token, "Invalid vote fixture", json!({})).await;

    for value in [0i16, 2, -3] {
        let (status, _) = cast(&app, &voter_token, alert_id, value).await;
        assert_eq!(status, 400, "value {value} should be rejected");
    }

    // Nothing was recorded
    let detail = common::get_alert_detail(&app, &voter_token, alert_id).await;
    assert_eq!(detail["data"]["positive_votes"], 0);
    assert_eq!(detail["data"]["negative_votes"], 0);
}

#[tokio::test]
async fn voting_on_missing_alert_is_not_found() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, voter_token) = common::create_test_user(&app, "voter_g").await;
    let (status, _) = cast(&app, &voter_token, 999_999_999, 1).await;
    assert_eq!(status, 404);
}
