mod common;

use serde_json::{json, Value};

async fn list(app: &common::TestApp, query: &str) -> Value {
    let resp = app
        .client
        .get(app.url(&format!("/alerts?{}", query)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn search_matches_description_case_insensitively() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "search_desc").await;
    common::create_test_alert(
        &app,
        &token,
        "Bridge collapse near XyzzyMarker river",
        json!({}),
    )
    .await;
    common::create_test_alert(&app, &token, "Unrelated incident", json!({})).await;

    let body = list(&app, "q=xyzzymarker").await;
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0]["description"]
        .as_str()
        .unwrap()
        .contains("XyzzyMarker"));
}

#[tokio::test]
async fn search_matches_hazard_kind_and_place_names() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "search_fields").await;
    common::create_test_alert(
        &app,
        &token,
        "Kind-search fixture",
        json!({"hazard_type": "tornado", "city": "Quuxville"}),
    )
    .await;

    let by_kind = list(&app, "q=TORNADO").await;
    assert!(by_kind["data"]["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["description"] == "Kind-search fixture"));

    let by_city = list(&app, "q=quuxville").await;
    assert!(by_city["data"]["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["description"] == "Kind-search fixture"));
}

#[tokio::test]
async fn pagination_defaults_to_four_and_clamps_page() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "paging").await;
    for i in 0..5 {
        common::create_test_alert(
            &app,
            &token,
            &format!("PagingMarker alert {i}"),
            json!({}),
        )
        .await;
    }

    let page1 = list(&app, "q=PagingMarker").await;
    assert_eq!(page1["data"]["alerts"].as_array().unwrap().len(), 4);
    assert_eq!(page1["data"]["page"], 1);
    assert_eq!(page1["data"]["num_pages"], 2);
    assert_eq!(page1["data"]["has_next"], true);
    assert_eq!(page1["data"]["has_previous"], false);

    // Newest first
    assert_eq!(
        page1["data"]["alerts"][0]["description"],
        "PagingMarker alert 4"
    );

    let page2 = list(&app, "q=PagingMarker&page=2").await;
    assert_eq!(page2["data"]["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(page2["data"]["has_next"], false);
    assert_eq!(page2["data"]["has_previous"], true);

    // Out-of-range page clamps to the last page instead of erroring
    let clamped = list(&app, "q=PagingMarker&page=99").await;
    assert_eq!(clamped["data"]["page"], 2);
    assert_eq!(clamped["data"]["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn archived_alerts_hidden_unless_requested() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, owner_token) = common::create_test_user(&app, "vis_owner").await;
    let (amb_id, amb_token) = common::create_test_user(&app, "vis_amb").await;
    common::make_ambassador(&app.db, amb_id).await;

    let alert_id = common::create_test_alert(
        &app,
        &owner_token,
        "VisibilityMarker fixture",
        json!({}),
    )
    .await;

    let resp = app
        .client
        .put(app.url(&format!("/alerts/{}/archive", alert_id)))
        .bearer_auth(&amb_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let active = list(&app, "q=VisibilityMarker").await;
    assert!(active["data"]["alerts"].as_array().unwrap().is_empty());

    let all = list(&app, "q=VisibilityMarker&active_only=false").await;
    assert_eq!(all["data"]["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn geojson_export_contains_point_features() {
    let Some(app) = common::spawn_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let (_, token) = common::create_test_user(&app, "geo_reporter").await;
    common::create_test_alert(
        &app,
        &token,
        "GeoMarker fixture",
        json!({"hazard_type": "storm", "hazard_details": {"wind_speed": 110.0}}),
    )
    .await;

    let resp = app
        .client
        .get(app.url("/alerts/geojson"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["type"], "FeatureCollection");
    let feature = body["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["properties"]["description"] == "GeoMarker fixture")
        .expect("fixture feature missing");

    assert_eq!(feature["type"], "Feature");
    assert_eq!(feature["geometry"]["type"], "Point");
    assert_eq!(
        feature["geometry"]["coordinates"].as_array().unwrap().len(),
        2
    );
    // [lng, lat] ordering
    assert_eq!(feature["geometry"]["coordinates"][0], 23.72);
    assert_eq!(feature["geometry"]["coordinates"][1], 37.98);
    assert_eq!(feature["properties"]["hazard_type"], "storm");
    assert_eq!(feature["properties"]["hazard_details"]["wind_speed"], 110.0);
    assert_eq!(feature["properties"]["is_active"], true);
}
