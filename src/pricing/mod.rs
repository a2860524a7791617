// Booth Pricing Module
//
// Prices exhibition booths in one of two modes:
// - Individual: booth area times a per-square-metre rate, reduced by the
//   exhibition's matching discount rules
// - Package: fixed-price bundles, plus any equipment beyond what they include
//
// The engine itself (matcher, resolvers, reconciler, facade) is pure; this
// module wires it to the catalog store and exposes rule/package management.

pub mod error;
pub mod types;
pub mod rules;
pub mod discount;
pub mod packages;
pub mod equipment;
pub mod engine;
pub mod store;
pub mod metrics;
pub mod handlers;

pub use error::{EngineResult, ErrorResponse, PricingError};
pub use types::{round_money, Discount, PricingMode, RuleType};
pub use rules::{MatchCriteria, PricingRule, RuleDefinition, RuleMatcher};
pub use discount::{AppliedDiscount, DiscountResolution, DiscountResolver};
pub use packages::{
    Package, PackageDefinition, PackageEquipment, PackageResolver, PackageTotals, SelectedPackage,
};
pub use equipment::{EquipmentCharge, EquipmentReconciler, Reconciliation, RequestedEquipment};
pub use engine::{compute_price, BookingContext, IndividualQuote, PackageQuote, PriceQuote};
pub use store::{CatalogStore, InMemoryCatalogStore, PgCatalogStore};
pub use metrics::{MetricsSummary, PerformanceMetrics, QuoteOutcome};
pub use handlers::{EquipmentSelection, PackageSelection, QuoteRequest};

// Pricing Service - Orchestrator
//
// Loads what a quote needs from the catalog, runs the engine and records
// metrics. Nothing is cached between calls.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::models::Exhibition;

pub struct PricingService {
    store: Arc<dyn CatalogStore>,
    metrics: PerformanceMetrics,
}

impl PricingService {
    pub fn new(store: Arc<dyn CatalogStore>, metrics: PerformanceMetrics) -> Self {
        Self { store, metrics }
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Price a booth
    ///
    /// Every call is timed and counted, whatever the outcome.
    pub async fn quote(&self, request: &QuoteRequest) -> EngineResult<PriceQuote> {
        let mut timer = self.metrics.start_quote();
        let result = self.build_quote(request).await;

        match &result {
            Ok(quote) => {
                timer.set_outcome(QuoteOutcome::Priced(quote.mode()));
                tracing::info!(
                    "Quoted exhibition {} ({} mode): final price {}",
                    request.exhibition_id,
                    quote.mode(),
                    quote.final_price()
                );
            }
            Err(PricingError::DatabaseError(_)) => timer.set_outcome(QuoteOutcome::Failed),
            Err(err) => {
                timer.set_outcome(QuoteOutcome::Refused);
                if err.is_refusal() {
                    tracing::warn!(
                        "Quote refused for exhibition {}: {}",
                        request.exhibition_id,
                        err.code()
                    );
                }
            }
        }

        result
    }

    async fn build_quote(&self, request: &QuoteRequest) -> EngineResult<PriceQuote> {
        request.validate()?;

        let exhibition = self.require_exhibition(request.exhibition_id).await?;

        let mut context = BookingContext {
            exhibition_id: exhibition.id,
            booth_size: Decimal::ZERO,
            price_per_sqm: Decimal::ZERO,
            registration_date: request.registration_date,
            participant_count: request.participant_count,
            mode: request.mode,
            selected_packages: Vec::new(),
            requested_equipment: Vec::new(),
        };

        let rules = match request.mode {
            PricingMode::Individual => {
                // Size is checked before the rate so a missing size wins
                context.booth_size = request
                    .booth_size
                    .filter(|size| *size > Decimal::ZERO)
                    .ok_or(PricingError::InvalidBoothSize)?;
                context.price_per_sqm = request
                    .price_per_sqm
                    .or(exhibition.price_per_sqm)
                    .ok_or(PricingError::InvalidPrice)?;

                self.store.list_pricing_rules(exhibition.id, false).await?
            }
            PricingMode::Package => {
                context.selected_packages = self
                    .select_packages(exhibition.id, &request.selected_packages)
                    .await?;
                Vec::new()
            }
        };

        context.requested_equipment = self.price_equipment(&request.requested_equipment).await?;

        tracing::debug!(
            "Pricing exhibition {} with {} rules, {} packages, {} equipment lines",
            exhibition.id,
            rules.len(),
            context.selected_packages.len(),
            context.requested_equipment.len()
        );

        compute_price(&context, &rules)
    }

    async fn require_exhibition(&self, exhibition_id: i32) -> EngineResult<Exhibition> {
        self.store
            .find_exhibition(exhibition_id)
            .await?
            .ok_or(PricingError::ExhibitionNotFound(exhibition_id))
    }

    /// Resolve package selections against the exhibition's packages
    async fn select_packages(
        &self,
        exhibition_id: i32,
        selections: &[PackageSelection],
    ) -> EngineResult<Vec<SelectedPackage>> {
        if selections.is_empty() {
            return Ok(Vec::new());
        }

        let packages = self.store.list_packages(exhibition_id).await?;

        selections
            .iter()
            .map(|selection| {
                packages
                    .iter()
                    .find(|package| package.package_id == selection.package_id)
                    .map(|package| SelectedPackage {
                        package: package.clone(),
                        quantity: selection.quantity,
                    })
                    .ok_or(PricingError::PackageNotFound(selection.package_id))
            })
            .collect()
    }

    /// Attach catalog unit prices to the requested equipment
    async fn price_equipment(
        &self,
        selections: &[EquipmentSelection],
    ) -> EngineResult<Vec<RequestedEquipment>> {
        if selections.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = selections.iter().map(|s| s.equipment_id).collect();
        let prices = self.catalog_prices(&ids).await?;

        selections
            .iter()
            .map(|selection| {
                let unit_price = prices
                    .get(&selection.equipment_id)
                    .copied()
                    .ok_or(PricingError::EquipmentNotFound(selection.equipment_id))?;
                Ok(RequestedEquipment {
                    equipment_id: selection.equipment_id,
                    quantity: selection.quantity,
                    unit_price,
                })
            })
            .collect()
    }

    async fn catalog_prices(&self, equipment_ids: &[i32]) -> EngineResult<HashMap<i32, Decimal>> {
        let mut ids = equipment_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        Ok(self
            .store
            .find_equipment(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item.price))
            .collect())
    }

    async fn require_equipment(&self, equipment_ids: &[i32]) -> EngineResult<()> {
        let prices = self.catalog_prices(equipment_ids).await?;
        match equipment_ids.iter().find(|id| !prices.contains_key(id)) {
            Some(&missing) => Err(PricingError::EquipmentNotFound(missing)),
            None => Ok(()),
        }
    }

    /// All rules of an exhibition, inactive ones included
    pub async fn list_rules(&self, exhibition_id: i32) -> EngineResult<Vec<PricingRule>> {
        self.require_exhibition(exhibition_id).await?;
        self.store.list_pricing_rules(exhibition_id, true).await
    }

    pub async fn create_rule(
        &self,
        exhibition_id: i32,
        definition: RuleDefinition,
    ) -> EngineResult<PricingRule> {
        definition.check()?;
        self.require_exhibition(exhibition_id).await?;

        let rule = PricingRule::from_definition(Uuid::new_v4(), exhibition_id, definition);
        self.store.insert_pricing_rule(&rule).await?;

        tracing::info!(
            "Created pricing rule {} ({}) for exhibition {}",
            rule.rule_id,
            rule.rule_name,
            exhibition_id
        );
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        rule_id: Uuid,
        definition: RuleDefinition,
    ) -> EngineResult<PricingRule> {
        definition.check()?;

        let rule = self
            .store
            .update_pricing_rule(rule_id, &definition)
            .await?
            .ok_or(PricingError::RuleNotFound(rule_id))?;

        tracing::info!("Updated pricing rule {}", rule_id);
        Ok(rule)
    }

    pub async fn deactivate_rule(&self, rule_id: Uuid) -> EngineResult<()> {
        if !self.store.deactivate_pricing_rule(rule_id).await? {
            return Err(PricingError::RuleNotFound(rule_id));
        }

        tracing::info!("Deactivated pricing rule {}", rule_id);
        Ok(())
    }

    pub async fn list_packages(&self, exhibition_id: i32) -> EngineResult<Vec<Package>> {
        self.require_exhibition(exhibition_id).await?;
        self.store.list_packages(exhibition_id).await
    }

    pub async fn create_package(
        &self,
        exhibition_id: i32,
        definition: PackageDefinition,
    ) -> EngineResult<Package> {
        definition.check()?;
        self.require_exhibition(exhibition_id).await?;
        self.require_equipment(&definition.equipment_ids()).await?;

        let package = Package::from_definition(Uuid::new_v4(), exhibition_id, definition);
        self.store.insert_package(&package).await?;

        tracing::info!(
            "Created package {} ({}) for exhibition {}",
            package.package_id,
            package.package_name,
            exhibition_id
        );
        Ok(package)
    }

    pub async fn update_package(
        &self,
        package_id: Uuid,
        definition: PackageDefinition,
    ) -> EngineResult<Package> {
        definition.check()?;
        self.require_equipment(&definition.equipment_ids()).await?;

        let package = self
            .store
            .update_package(package_id, &definition)
            .await?
            .ok_or(PricingError::PackageNotFound(package_id))?;

        tracing::info!("Updated package {}", package_id);
        Ok(package)
    }

    pub async fn delete_package(&self, package_id: Uuid) -> EngineResult<()> {
        if !self.store.delete_package(package_id).await? {
            return Err(PricingError::PackageNotFound(package_id));
        }

        tracing::info!("Deleted package {}", package_id);
        Ok(())
    }
}
