mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use dock_ledger::handlers::common::today;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

async fn seed(app: &TestApp) -> (String, String) {
    let company = app
        .request(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Distribuidora Norte" })),
        )
        .await;
    assert_eq!(company.status, StatusCode::OK);
    let company = company.json();
    assert_eq!(company["data"]["created"], true);

    let product = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Paper towels",
                "category": "paper",
                "units_per_layer": 5,
                "layers_per_pallet": 10
            })),
        )
        .await
        .json();
    assert_eq!(product["data"]["full_pallet_units"], 50);

    (
        company["data"]["id"].as_str().unwrap().to_string(),
        product["data"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn status_endpoint_reports_service() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "dock-ledger");
}

#[tokio::test]
async fn day_flow_over_http() {
    let app = TestApp::new().await;
    let (company_id, product_id) = seed(&app).await;

    let registered = app
        .request(
            Method::POST,
            "/api/v1/unloading/events",
            Some(json!({
                "company_id": company_id,
                "driver_name": "Juan Perez",
                "plate": "gba-1234",
                "items": [
                    { "product_id": product_id, "full_pallets": 2, "loose_units": 25 }
                ]
            })),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let event = registered.json();
    assert_eq!(event["data"]["type"], "complete");
    assert_eq!(event["data"]["plate"], "GBA-1234");
    assert_eq!(decimal(&event["data"]["total_pallets"]), dec!(2.5));
    let event_id = event["data"]["id"].as_str().unwrap().to_string();

    let summary = app
        .request(Method::GET, "/api/v1/unloading/summary", None)
        .await
        .json();
    assert_eq!(summary["data"]["state"], "open");
    assert_eq!(summary["data"]["event_count"], 1);

    let closed = app
        .request(
            Method::POST,
            "/api/v1/unloading/close",
            Some(json!({ "notes": "done" })),
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK);
    let closed = closed.json();
    assert_eq!(closed["data"]["ok"], true);
    assert_eq!(decimal(&closed["data"]["total_pallets"]), dec!(2.5));

    let again = app.request(Method::POST, "/api/v1/unloading/close", None).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.json()["kind"], "already_closed");

    let blocked = app
        .request(Method::DELETE, &format!("/api/v1/unloading/events/{}", event_id), None)
        .await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);
    assert_eq!(blocked.json()["kind"], "ledger_closed");

    let detail = app
        .request(Method::GET, &format!("/api/v1/unloading/days/{}", today()), None)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    let detail = detail.json();
    assert_eq!(detail["data"]["total_companies"], 1);
    assert_eq!(detail["data"]["groups"][0]["company"], "Distribuidora Norte");

    let reopened = app.request(Method::POST, "/api/v1/unloading/reopen", None).await;
    assert_eq!(reopened.status, StatusCode::OK);
    let deleted = app
        .request(Method::DELETE, &format!("/api/v1/unloading/events/{}", event_id), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["data"]["deleted"], true);
}

#[tokio::test]
async fn register_errors_carry_kinds() {
    let app = TestApp::new().await;
    let (company_id, _) = seed(&app).await;

    let empty = app
        .request(
            Method::POST,
            "/api/v1/unloading/events",
            Some(json!({ "company_id": company_id, "items": [] })),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json()["kind"], "empty_items");

    let unknown = app
        .request(
            Method::POST,
            "/api/v1/unloading/events",
            Some(json!({
                "company_id": uuid::Uuid::new_v4(),
                "items": [{ "product_id": uuid::Uuid::new_v4(), "full_pallets": 1 }]
            })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown.json()["kind"], "invalid_reference");
}

#[tokio::test]
async fn malformed_requests_get_structured_errors() {
    let app = TestApp::new().await;

    let bad_body = app
        .request(
            Method::POST,
            "/api/v1/unloading/events",
            Some(json!({ "company_id": "not-a-uuid", "items": [] })),
        )
        .await;
    assert_eq!(bad_body.status, StatusCode::BAD_REQUEST);
    let body = bad_body.json();
    assert_eq!(body["kind"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("company_id"));

    let bad_path = app
        .request(Method::GET, "/api/v1/unloading/events/not-a-uuid", None)
        .await;
    assert_eq!(bad_path.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_path.json()["kind"], "validation_error");

    let bad_query = app
        .request(Method::GET, "/api/v1/unloading/ledgers?limit=many", None)
        .await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query.json()["kind"], "validation_error");
}

#[tokio::test]
async fn day_detail_rejects_bad_and_unknown_dates() {
    let app = TestApp::new().await;

    let bad = app
        .request(Method::GET, "/api/v1/unloading/days/09-12-2024", None)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.json()["kind"], "validation_error");

    let unknown = app
        .request(Method::GET, "/api/v1/unloading/days/2001-01-01", None)
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exports_are_plain_text_attachments() {
    let app = TestApp::new().await;
    let (company_id, product_id) = seed(&app).await;
    let event = app
        .request(
            Method::POST,
            "/api/v1/unloading/events",
            Some(json!({
                "company_id": company_id,
                "plate": "pbx-77",
                "items": [{ "product_id": product_id, "full_pallets": 3 }]
            })),
        )
        .await
        .json();
    let event_id = event["data"]["id"].as_str().unwrap();

    let receipt = app
        .request(
            Method::GET,
            &format!("/api/v1/unloading/events/{}/receipt", event_id),
            None,
        )
        .await;
    assert_eq!(receipt.status, StatusCode::OK);
    assert!(receipt.content_type.starts_with("text/plain"));
    assert!(receipt.text.contains("Test Dock"));
    assert!(receipt.text.contains("PBX-77"));

    let export = app
        .request(
            Method::GET,
            &format!("/api/v1/unloading/days/{}/export", today()),
            None,
        )
        .await;
    assert_eq!(export.status, StatusCode::OK);
    let disposition = export.disposition.expect("content disposition");
    assert!(disposition.contains(&format!("unloading_{}.txt", today())));
    assert!(export.text.contains("Distribuidora Norte"));
}

#[tokio::test]
async fn attendance_over_http() {
    let app = TestApp::new().await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/employees",
            Some(json!({
                "national_id": "0911111111",
                "first_names": "Ana",
                "last_names": "Torres",
                "position": "Loader",
                "hire_date": "2023-03-01"
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let employee_id = created.json()["data"]["id"].as_str().unwrap().to_string();

    let checked_in = app
        .request(
            Method::POST,
            "/api/v1/attendance/check-in",
            Some(json!({
                "employee_ids": [employee_id],
                "work_date": "2024-12-09",
                "check_in": "07:00"
            })),
        )
        .await;
    assert_eq!(checked_in.status, StatusCode::OK);
    assert_eq!(checked_in.json()["data"]["created"], 1);

    let checked_out = app
        .request(
            Method::POST,
            "/api/v1/attendance/check-out",
            Some(json!({
                "employee_id": employee_id,
                "work_date": "2024-12-09",
                "check_out": "15:45"
            })),
        )
        .await;
    assert_eq!(checked_out.status, StatusCode::OK);
    assert_eq!(checked_out.json()["data"]["duration"], "8h 45m");

    let overview = app
        .request(
            Method::GET,
            "/api/v1/attendance/overview?date=2024-12-09",
            None,
        )
        .await
        .json();
    assert_eq!(overview["data"]["total_present"], 1);
    assert_eq!(overview["data"]["pending"].as_array().unwrap().len(), 0);

    let bad_time = app
        .request(
            Method::POST,
            "/api/v1/attendance/check-in",
            Some(json!({ "employee_ids": [employee_id], "check_in": "7am" })),
        )
        .await;
    assert_eq!(bad_time.status, StatusCode::BAD_REQUEST);
}
