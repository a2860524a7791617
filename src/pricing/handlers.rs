// HTTP handlers for quoting and pricing catalog management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{
    engine::{IndividualQuote, PriceQuote},
    metrics::MetricsSummary,
    packages::{Package, PackageDefinition},
    rules::{PricingRule, RuleDefinition},
    types::PricingMode,
    PricingError,
};

/// Package chosen in a quote request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PackageSelection {
    pub package_id: Uuid,
    #[validate(range(min = 1, message = "Package quantity must be at least 1"))]
    pub quantity: u32,
}

/// Equipment line in a quote request; priced from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentSelection {
    #[schema(example = 5)]
    pub equipment_id: i32,
    #[schema(example = 3)]
    pub quantity: u32,
}

/// Request DTO for a booth quote
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    #[schema(example = 1)]
    pub exhibition_id: i32,
    /// Required in individual mode, ignored in package mode
    #[schema(example = "20")]
    pub booth_size: Option<Decimal>,
    /// Manual rate taking precedence over the exhibition default
    pub price_per_sqm: Option<Decimal>,
    pub registration_date: DateTime<Utc>,
    #[validate(range(min = 1, message = "Participant count must be at least 1"))]
    #[schema(example = 2)]
    pub participant_count: u32,
    pub mode: PricingMode,
    #[serde(default)]
    #[validate]
    pub selected_packages: Vec<PackageSelection>,
    #[serde(default)]
    pub requested_equipment: Vec<EquipmentSelection>,
}

/// Handler for POST /api/pricing/quote
/// Prices a booth in individual or package mode
#[utoipa::path(
    post,
    path = "/api/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed; package mode returns a PackageQuote", body = IndividualQuote),
        (status = 400, description = "Booking cannot be priced", body = String, example = json!({"error": "INVALID_BOOTH_SIZE", "message": "Booth size must be greater than zero", "timestamp": "2024-03-01T10:00:00+00:00"})),
        (status = 404, description = "Unknown exhibition, package or equipment", body = String, example = json!({"error": "EXHIBITION_NOT_FOUND", "message": "Exhibition not found: 7", "timestamp": "2024-03-01T10:00:00+00:00"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "DATABASE_ERROR"}))
    ),
    tag = "pricing"
)]
pub async fn quote_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PriceQuote>, PricingError> {
    tracing::debug!(
        "Quote requested for exhibition {} in {} mode",
        request.exhibition_id,
        request.mode
    );

    let quote = state.pricing.quote(&request).await?;
    Ok(Json(quote))
}

/// Handler for GET /api/exhibitions/:id/pricing-rules
/// Lists every rule of an exhibition, inactive ones included
#[utoipa::path(
    get,
    path = "/api/exhibitions/{id}/pricing-rules",
    params(("id" = i32, Path, description = "Exhibition ID")),
    responses(
        (status = 200, description = "Rules in definition order", body = Vec<PricingRule>),
        (status = 404, description = "Exhibition not found", body = String, example = json!({"error": "EXHIBITION_NOT_FOUND"}))
    ),
    tag = "pricing-rules"
)]
pub async fn list_pricing_rules_handler(
    State(state): State<crate::AppState>,
    Path(exhibition_id): Path<i32>,
) -> Result<Json<Vec<PricingRule>>, PricingError> {
    let rules = state.pricing.list_rules(exhibition_id).await?;
    Ok(Json(rules))
}

/// Handler for POST /api/exhibitions/:id/pricing-rules
#[utoipa::path(
    post,
    path = "/api/exhibitions/{id}/pricing-rules",
    params(("id" = i32, Path, description = "Exhibition ID")),
    request_body = RuleDefinition,
    responses(
        (status = 201, description = "Rule created", body = PricingRule),
        (status = 400, description = "Invalid rule definition", body = String, example = json!({"error": "INVALID_PRICING_RULE"})),
        (status = 404, description = "Exhibition not found", body = String, example = json!({"error": "EXHIBITION_NOT_FOUND"}))
    ),
    tag = "pricing-rules"
)]
pub async fn create_pricing_rule_handler(
    State(state): State<crate::AppState>,
    Path(exhibition_id): Path<i32>,
    Json(definition): Json<RuleDefinition>,
) -> Result<(StatusCode, Json<PricingRule>), PricingError> {
    let rule = state.pricing.create_rule(exhibition_id, definition).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Handler for PUT /api/pricing-rules/:rule_id
#[utoipa::path(
    put,
    path = "/api/pricing-rules/{rule_id}",
    params(("rule_id" = Uuid, Path, description = "Pricing rule ID")),
    request_body = RuleDefinition,
    responses(
        (status = 200, description = "Rule replaced", body = PricingRule),
        (status = 400, description = "Invalid rule definition", body = String, example = json!({"error": "INVALID_PRICING_RULE"})),
        (status = 404, description = "Rule not found", body = String, example = json!({"error": "RULE_NOT_FOUND"}))
    ),
    tag = "pricing-rules"
)]
pub async fn update_pricing_rule_handler(
    State(state): State<crate::AppState>,
    Path(rule_id): Path<Uuid>,
    Json(definition): Json<RuleDefinition>,
) -> Result<Json<PricingRule>, PricingError> {
    let rule = state.pricing.update_rule(rule_id, definition).await?;
    Ok(Json(rule))
}

/// Handler for DELETE /api/pricing-rules/:rule_id
/// Deactivates the rule; it stays listed but never matches again
#[utoipa::path(
    delete,
    path = "/api/pricing-rules/{rule_id}",
    params(("rule_id" = Uuid, Path, description = "Pricing rule ID")),
    responses(
        (status = 204, description = "Rule deactivated"),
        (status = 404, description = "Rule not found", body = String, example = json!({"error": "RULE_NOT_FOUND"}))
    ),
    tag = "pricing-rules"
)]
pub async fn delete_pricing_rule_handler(
    State(state): State<crate::AppState>,
    Path(rule_id): Path<Uuid>,
) -> Result<StatusCode, PricingError> {
    state.pricing.deactivate_rule(rule_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/exhibitions/:id/packages
#[utoipa::path(
    get,
    path = "/api/exhibitions/{id}/packages",
    params(("id" = i32, Path, description = "Exhibition ID")),
    responses(
        (status = 200, description = "Packages offered by the exhibition", body = Vec<Package>),
        (status = 404, description = "Exhibition not found", body = String, example = json!({"error": "EXHIBITION_NOT_FOUND"}))
    ),
    tag = "packages"
)]
pub async fn list_packages_handler(
    State(state): State<crate::AppState>,
    Path(exhibition_id): Path<i32>,
) -> Result<Json<Vec<Package>>, PricingError> {
    let packages = state.pricing.list_packages(exhibition_id).await?;
    Ok(Json(packages))
}

/// Handler for POST /api/exhibitions/:id/packages
#[utoipa::path(
    post,
    path = "/api/exhibitions/{id}/packages",
    params(("id" = i32, Path, description = "Exhibition ID")),
    request_body = PackageDefinition,
    responses(
        (status = 201, description = "Package created", body = Package),
        (status = 400, description = "Invalid package definition", body = String, example = json!({"error": "INVALID_PACKAGE"})),
        (status = 404, description = "Exhibition or bundled equipment not found", body = String, example = json!({"error": "EQUIPMENT_NOT_FOUND"}))
    ),
    tag = "packages"
)]
pub async fn create_package_handler(
    State(state): State<crate::AppState>,
    Path(exhibition_id): Path<i32>,
    Json(definition): Json<PackageDefinition>,
) -> Result<(StatusCode, Json<Package>), PricingError> {
    let package = state.pricing.create_package(exhibition_id, definition).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

/// Handler for PUT /api/packages/:package_id
#[utoipa::path(
    put,
    path = "/api/packages/{package_id}",
    params(("package_id" = Uuid, Path, description = "Package ID")),
    request_body = PackageDefinition,
    responses(
        (status = 200, description = "Package replaced", body = Package),
        (status = 400, description = "Invalid package definition", body = String, example = json!({"error": "INVALID_PACKAGE"})),
        (status = 404, description = "Package or bundled equipment not found", body = String, example = json!({"error": "PACKAGE_NOT_FOUND"}))
    ),
    tag = "packages"
)]
pub async fn update_package_handler(
    State(state): State<crate::AppState>,
    Path(package_id): Path<Uuid>,
    Json(definition): Json<PackageDefinition>,
) -> Result<Json<Package>, PricingError> {
    let package = state.pricing.update_package(package_id, definition).await?;
    Ok(Json(package))
}

/// Handler for DELETE /api/packages/:package_id
#[utoipa::path(
    delete,
    path = "/api/packages/{package_id}",
    params(("package_id" = Uuid, Path, description = "Package ID")),
    responses(
        (status = 204, description = "Package deleted"),
        (status = 404, description = "Package not found", body = String, example = json!({"error": "PACKAGE_NOT_FOUND"}))
    ),
    tag = "packages"
)]
pub async fn delete_package_handler(
    State(state): State<crate::AppState>,
    Path(package_id): Path<Uuid>,
) -> Result<StatusCode, PricingError> {
    state.pricing.delete_package(package_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/pricing/metrics
#[utoipa::path(
    get,
    path = "/api/pricing/metrics",
    responses(
        (status = 200, description = "Quote counters and timings", body = MetricsSummary)
    ),
    tag = "pricing"
)]
pub async fn get_metrics_handler(State(state): State<crate::AppState>) -> Json<MetricsSummary> {
    Json(state.pricing.metrics().summary())
}
