//! HTTP-level tests for the service entry CRUD endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{
    admin_token, body_json, build_test_app, delete_auth, get_auth, post_json_auth, put_json_auth,
};

const ENTRIES: &str = "/api/v1/service-entries";

fn entry_body(plate: &str, service_date: &str) -> Value {
    json!({
        "license_plate": plate,
        "brand_name": "Ford",
        "model_name": "Focus",
        "odometer": 250000,
        "model_year": 2020,
        "service_date": service_date,
        "has_warranty": false,
        "service_city": "Ankara",
        "service_note": "Oil and filter change"
    })
}

async fn create(app: &axum::Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, ENTRIES, body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_stores_canonical_entry() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let data = create(
        &app.router,
        &token,
        entry_body(" 34abc123 ", "2024-05-01T10:00:00Z"),
    )
    .await;

    assert_eq!(data["license_plate"], "34ABC123");
    assert_eq!(data["brand_name"], "Ford");
    assert_eq!(data["service_date"], "2024-05-01T10:00:00Z");
    assert!(data["id"].is_string());
    assert_eq!(app.stores.committed_entry_count().await, 1);
}

#[tokio::test]
async fn offset_service_dates_are_stored_in_utc() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let data = create(
        &app.router,
        &token,
        entry_body("06AB1234", "2024-05-01T13:00:00+03:00"),
    )
    .await;

    assert_eq!(data["service_date"], "2024-05-01T10:00:00Z");
}

#[tokio::test]
async fn same_plate_same_day_is_a_conflict() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    create(&app.router, &token, entry_body("34ABC123", "2024-05-01T09:00:00Z")).await;

    let response = post_json_auth(
        &app.router,
        ENTRIES,
        entry_body("34abc123", "2024-05-01T18:30:00Z"),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(
        json["error"],
        "A service entry for plate 34ABC123 already exists on 2024-05-01"
    );
    assert_eq!(app.stores.committed_entry_count().await, 1);
}

#[tokio::test]
async fn same_plate_next_day_is_accepted() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;

    create(&app.router, &token, entry_body("34ABC123", "2024-05-02")).await;

    assert_eq!(app.stores.committed_entry_count().await, 2);
}

#[tokio::test]
async fn invalid_payload_reports_every_field() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let response = post_json_auth(
        &app.router,
        ENTRIES,
        json!({
            "license_plate": "XYZ",
            "brand_name": "",
            "model_name": "Focus",
            "service_date": "2024-05-01"
        }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let errors = json["errors"].as_object().unwrap();
    assert!(errors.contains_key("license_plate"));
    assert!(errors.contains_key("brand_name"));
    assert!(errors.contains_key("odometer"));
    assert!(!errors.contains_key("model_name"));
    assert_eq!(app.stores.read_count(), 0);
    assert_eq!(app.stores.committed_entry_count().await, 0);
}

#[tokio::test]
async fn implausible_mileage_is_rejected() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let mut body = entry_body("34ABC123", "2024-05-01");
    body["odometer"] = json!(400000);
    let response = post_json_auth(&app.router, ENTRIES, body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["errors"]["odometer"][0],
        "Odometer reading looks too high for the vehicle's age, please check it"
    );
}

#[tokio::test]
async fn future_service_date_is_rejected() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let response = post_json_auth(
        &app.router,
        ENTRIES,
        entry_body("34ABC123", "2025-06-20"),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["errors"]["service_date"][0],
        "Service date cannot be in the future"
    );
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_pages_newest_first() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    for day in ["2024-05-01", "2024-05-03", "2024-05-02"] {
        create(&app.router, &token, entry_body("34ABC123", day)).await;
    }

    let response = get_auth(&app.router, &format!("{ENTRIES}?page_size=2"), &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_count"], 3);
    assert_eq!(data["page_number"], 1);
    assert_eq!(data["page_size"], 2);
    let items = data["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["service_date"], "2024-05-03T00:00:00Z");
    assert_eq!(items[1]["service_date"], "2024-05-02T00:00:00Z");
}

#[tokio::test]
async fn list_filters_by_canonical_plate() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;
    create(&app.router, &token, entry_body("06AB1234", "2024-05-01")).await;

    let response = get_auth(
        &app.router,
        &format!("{ENTRIES}?license_plate=06ab1234"),
        &token,
    )
    .await;

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["total_count"], 1);
    assert_eq!(data["items"][0]["license_plate"], "06AB1234");
}

#[tokio::test]
async fn plate_filter_does_not_strip_inner_spaces() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;

    let response = get_auth(
        &app.router,
        &format!("{ENTRIES}?license_plate=34%20abc%20123"),
        &token,
    )
    .await;

    assert_eq!(body_json(response).await["data"]["total_count"], 0);
}

#[tokio::test]
async fn bad_pagination_is_rejected_before_reading() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    for query in [
        "page_size=0",
        "page_size=101",
        "page_number=0",
        "page_number=-1",
        "page_size=-5",
    ] {
        let response = get_auth(&app.router, &format!("{ENTRIES}?{query}"), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query {query}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
    assert_eq!(app.stores.read_count(), 0);
}

#[tokio::test]
async fn get_unknown_entry_is_not_found() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    let id = uuid::Uuid::now_v7();

    let response = get_auth(&app.router, &format!("{ENTRIES}/{id}"), &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], format!("service entry with id {id} not found"));
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let response = get_auth(&app.router, &format!("{ENTRIES}/not-a-uuid"), &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_replaces_fields() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    let created = create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;
    let id = created["id"].as_str().unwrap();

    let mut body = entry_body("34ABC123", "2024-05-01T15:00:00Z");
    body["odometer"] = json!(260000);
    body["service_note"] = json!("Brake pads");
    let response = put_json_auth(&app.router, &format!("{ENTRIES}/{id}"), body, &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["id"], created["id"]);
    assert_eq!(data["odometer"], 260000);
    assert_eq!(data["service_note"], "Brake pads");
    assert_eq!(data["created_at"], created["created_at"]);
    assert!(data["updated_at"].is_string());
}

#[tokio::test]
async fn update_into_another_entrys_day_is_a_conflict() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;
    let other = create(&app.router, &token, entry_body("34ABC123", "2024-05-02")).await;
    let id = other["id"].as_str().unwrap();

    let response = put_json_auth(
        &app.router,
        &format!("{ENTRIES}/{id}"),
        entry_body("34ABC123", "2024-05-01T12:00:00Z"),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_unknown_entry_is_not_found() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;

    let response = put_json_auth(
        &app.router,
        &format!("{ENTRIES}/{}", uuid::Uuid::now_v7()),
        entry_body("34ABC123", "2024-05-01"),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_entry() {
    let app = build_test_app().await;
    let token = admin_token(&app.router).await;
    let created = create(&app.router, &token, entry_body("34ABC123", "2024-05-01")).await;
    let uri = format!("{ENTRIES}/{}", created["id"].as_str().unwrap());

    let response = delete_auth(&app.router, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(get_auth(&app.router, &uri, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete_auth(&app.router, &uri, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.stores.committed_entry_count().await, 0);
}
