pub mod config;
pub mod db;
pub mod models;
pub mod pricing;
pub mod validation;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use models::{Equipment, Exhibition};
use pricing::{
    handlers, AppliedDiscount, EquipmentCharge, EquipmentSelection, IndividualQuote,
    MetricsSummary, Package, PackageDefinition, PackageEquipment, PackageQuote, PackageSelection,
    PricingMode, PricingRule, PricingService, QuoteRequest, RuleDefinition, RuleType,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::quote_handler,
        handlers::list_pricing_rules_handler,
        handlers::create_pricing_rule_handler,
        handlers::update_pricing_rule_handler,
        handlers::delete_pricing_rule_handler,
        handlers::list_packages_handler,
        handlers::create_package_handler,
        handlers::update_package_handler,
        handlers::delete_package_handler,
        handlers::get_metrics_handler,
    ),
    components(
        schemas(
            QuoteRequest, PackageSelection, EquipmentSelection, PricingMode,
            IndividualQuote, PackageQuote, AppliedDiscount, EquipmentCharge,
            PricingRule, RuleDefinition, RuleType,
            Package, PackageDefinition, PackageEquipment,
            Exhibition, Equipment, MetricsSummary
        )
    ),
    tags(
        (name = "pricing", description = "Booth quotes and pricing metrics"),
        (name = "pricing-rules", description = "Discount rule management"),
        (name = "packages", description = "Booth package management")
    ),
    info(
        title = "Exhibition Booth Pricing API",
        version = "1.0.0",
        description = "Quotes exhibition booths per square metre or by package, with stacked discount rules"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<PricingService>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds tracing and CORS layers
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/api/pricing/quote", post(handlers::quote_handler))
        .route("/api/pricing/metrics", get(handlers::get_metrics_handler))
        .route(
            "/api/exhibitions/:id/pricing-rules",
            get(handlers::list_pricing_rules_handler).post(handlers::create_pricing_rule_handler),
        )
        .route(
            "/api/pricing-rules/:rule_id",
            put(handlers::update_pricing_rule_handler).delete(handlers::delete_pricing_rule_handler),
        )
        .route(
            "/api/exhibitions/:id/packages",
            get(handlers::list_packages_handler).post(handlers::create_package_handler),
        )
        .route(
            "/api/packages/:package_id",
            put(handlers::update_package_handler).delete(handlers::delete_package_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
