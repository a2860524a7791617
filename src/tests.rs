// Handler tests for the booth pricing API
// Run against the in-memory catalog, no database required

use super::*;
use crate::pricing::{InMemoryCatalogStore, PerformanceMetrics};
use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

fn seeded_store() -> InMemoryCatalogStore {
    InMemoryCatalogStore::new()
        .with_exhibition(Exhibition {
            id: 1,
            name: "Spring Trade Fair".to_string(),
            price_per_sqm: Some(dec!(100)),
            starts_at: None,
            ends_at: None,
        })
        .with_exhibition(Exhibition {
            id: 2,
            name: "Unpriced Expo".to_string(),
            price_per_sqm: None,
            starts_at: None,
            ends_at: None,
        })
        .with_equipment(Equipment {
            id: 5,
            code_name: "SPOT-LED".to_string(),
            price: dec!(50),
        })
}

fn create_test_app() -> TestServer {
    let state = AppState {
        pricing: Arc::new(PricingService::new(
            Arc::new(seeded_store()),
            PerformanceMetrics::new(),
        )),
    };

    TestServer::new(create_router(state)).unwrap()
}

fn individual_payload(booth_size: Value) -> Value {
    json!({
        "exhibition_id": 1,
        "booth_size": booth_size,
        "registration_date": "2024-02-01T09:00:00Z",
        "participant_count": 2,
        "mode": "individual"
    })
}

fn early_bird_rule() -> Value {
    json!({
        "rule_name": "Early bird",
        "rule_type": "early_bird",
        "discount_percentage": 10,
        "priority": 1
    })
}

async fn create_rule(server: &TestServer, rule: Value) -> Value {
    let response = server
        .post("/api/exhibitions/1/pricing-rules")
        .json(&rule)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_corner_package(server: &TestServer) -> Value {
    let response = server
        .post("/api/exhibitions/1/packages")
        .json(&json!({
            "package_name": "Corner booth",
            "fixed_area_sqm": 12,
            "fixed_price": 1000,
            "equipment_list": [{ "equipment_id": 5, "quantity": 2 }]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

// ============================================================================
// Quote Tests (POST /api/pricing/quote)
// ============================================================================

#[tokio::test]
async fn test_quote_single_early_bird() {
    let server = create_test_app();
    create_rule(&server, early_bird_rule()).await;

    let response = server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(20)))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["mode"], "individual");
    assert_eq!(body["base_price"], "2000.00");
    assert_eq!(body["discount_amount"], "200.00");
    assert_eq!(body["final_price"], "1800.00");
    assert_eq!(body["applied_discounts"][0]["rule_name"], "Early bird");
}

#[tokio::test]
async fn test_quote_stacked_discounts() {
    let server = create_test_app();
    create_rule(
        &server,
        json!({
            "rule_name": "Loyal exhibitor",
            "rule_type": "volume",
            "fixed_discount_amount": 50,
            "priority": 2
        }),
    )
    .await;
    create_rule(&server, early_bird_rule()).await;

    let response = server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(20)))
        .await;

    let body: Value = response.json();
    assert_eq!(body["applied_discounts"][0]["discount_amount"], "200.00");
    assert_eq!(body["applied_discounts"][1]["discount_amount"], "50.00");
    assert_eq!(body["final_price"], "1750.00");
}

#[tokio::test]
async fn test_quote_package_with_extra_equipment() {
    let server = create_test_app();
    let package = create_corner_package(&server).await;

    let response = server
        .post("/api/pricing/quote")
        .json(&json!({
            "exhibition_id": 1,
            "registration_date": "2024-02-01T09:00:00Z",
            "participant_count": 1,
            "mode": "package",
            "selected_packages": [{ "package_id": package["package_id"], "quantity": 1 }],
            "requested_equipment": [{ "equipment_id": 5, "quantity": 3 }]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["mode"], "package");
    assert_eq!(body["total_area"], "12");
    assert_eq!(body["total_package_price"], "1000.00");
    assert_eq!(body["equipment_charges"][0]["included_quantity"], 2);
    assert_eq!(body["equipment_charges"][0]["chargeable_quantity"], 1);
    assert_eq!(body["additional_equipment_cost"], "50.00");
    assert_eq!(body["final_price"], "1050.00");
}

#[tokio::test]
async fn test_quote_zero_booth_size_has_no_numbers() {
    let server = create_test_app();
    create_rule(&server, early_bird_rule()).await;

    let response = server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(0)))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "INVALID_BOOTH_SIZE");
    for field in ["base_price", "discount_amount", "final_price", "price_per_sqm"] {
        assert!(body.get(field).is_none(), "unexpected field {}", field);
    }
}

#[tokio::test]
async fn test_quote_without_rate_is_invalid_price() {
    let server = create_test_app();
    let mut payload = individual_payload(json!(10));
    payload["exhibition_id"] = json!(2);

    let response = server.post("/api/pricing/quote").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "INVALID_PRICE");
}

#[tokio::test]
async fn test_quote_base_price_out_of_range() {
    let server = create_test_app();
    let payload = individual_payload(json!("79228162514264337593543950335"));

    let response = server.post("/api/pricing/quote").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "AMOUNT_OUT_OF_RANGE");
    assert!(body.get("final_price").is_none());
}

#[tokio::test]
async fn test_quote_unknown_exhibition() {
    let server = create_test_app();
    let mut payload = individual_payload(json!(10));
    payload["exhibition_id"] = json!(404);

    let response = server.post("/api/pricing/quote").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "EXHIBITION_NOT_FOUND");
}

#[tokio::test]
async fn test_quote_rejects_zero_participants() {
    let server = create_test_app();
    let mut payload = individual_payload(json!(10));
    payload["participant_count"] = json!(0);

    let response = server.post("/api/pricing/quote").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

// ============================================================================
// Pricing Rule Management Tests
// ============================================================================

#[tokio::test]
async fn test_rule_lifecycle() {
    let server = create_test_app();
    let rule = create_rule(&server, early_bird_rule()).await;
    let rule_id = rule["rule_id"].as_str().unwrap().to_string();
    assert_eq!(rule["is_active"], true);

    let response = server
        .put(&format!("/api/pricing-rules/{}", rule_id))
        .json(&json!({
            "rule_name": "Early bird (extended)",
            "rule_type": "early_bird",
            "discount_percentage": 15,
            "priority": 1
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["discount_percentage"], "15");

    let response = server.delete(&format!("/api/pricing-rules/{}", rule_id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.get("/api/exhibitions/1/pricing-rules").await;
    let rules: Vec<Value> = response.json();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["is_active"], false);

    // A deactivated rule no longer discounts
    let response = server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(20)))
        .await;
    let body: Value = response.json();
    assert_eq!(body["final_price"], "2000.00");
}

#[tokio::test]
async fn test_create_rule_with_invalid_priority() {
    let server = create_test_app();
    let mut rule = early_bird_rule();
    rule["priority"] = json!(0);

    let response = server
        .post("/api/exhibitions/1/pricing-rules")
        .json(&rule)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "INVALID_PRICING_RULE");
}

#[tokio::test]
async fn test_create_rule_with_unstorable_percentage() {
    let server = create_test_app();
    let mut rule = early_bird_rule();
    rule["discount_percentage"] = json!("33.333");

    let response = server
        .post("/api/exhibitions/1/pricing-rules")
        .json(&rule)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "INVALID_PRICING_RULE");

    let listed: Value = server.get("/api/exhibitions/1/pricing-rules").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_unknown_rule() {
    let server = create_test_app();

    let response = server
        .put("/api/pricing-rules/00000000-0000-0000-0000-000000000000")
        .json(&early_bird_rule())
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "RULE_NOT_FOUND");
}

#[tokio::test]
async fn test_rules_for_unknown_exhibition() {
    let server = create_test_app();
    let response = server.get("/api/exhibitions/77/pricing-rules").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Package Management Tests
// ============================================================================

#[tokio::test]
async fn test_package_lifecycle() {
    let server = create_test_app();
    let package = create_corner_package(&server).await;
    let package_id = package["package_id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/packages/{}", package_id))
        .json(&json!({
            "package_name": "Corner booth XL",
            "fixed_area_sqm": 18,
            "fixed_price": 1400,
            "equipment_list": [{ "equipment_id": 5, "quantity": 4 }]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get("/api/exhibitions/1/packages").await;
    let packages: Vec<Value> = response.json();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["package_name"], "Corner booth XL");
    assert_eq!(packages[0]["equipment_list"][0]["quantity"], 4);

    let response = server.delete(&format!("/api/packages/{}", package_id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server.delete(&format!("/api/packages/{}", package_id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_package_with_unknown_equipment() {
    let server = create_test_app();

    let response = server
        .post("/api/exhibitions/1/packages")
        .json(&json!({
            "package_name": "Island",
            "fixed_area_sqm": 30,
            "fixed_price": 2500,
            "equipment_list": [{ "equipment_id": 99, "quantity": 1 }]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "EQUIPMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_create_package_with_zero_area() {
    let server = create_test_app();

    let response = server
        .post("/api/exhibitions/1/packages")
        .json(&json!({
            "package_name": "Nothing",
            "fixed_area_sqm": 0,
            "fixed_price": 100
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "INVALID_PACKAGE");
}

// ============================================================================
// Metrics and Health
// ============================================================================

#[tokio::test]
async fn test_metrics_count_quotes() {
    let server = create_test_app();

    server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(20)))
        .await;
    server
        .post("/api/pricing/quote")
        .json(&individual_payload(json!(0)))
        .await;

    let response = server.get("/api/pricing/metrics").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total_quotes"], 2);
    assert_eq!(body["individual_quotes"], 1);
    assert_eq!(body["refused_quotes"], 1);
}

#[tokio::test]
async fn test_health() {
    let server = create_test_app();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}
