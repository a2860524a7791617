// Pricing Facade
//
// Pure entry point of the engine. Dispatches a booking either to the
// per-square-metre path (rule matching and discount resolution) or to the
// package path (package totals and equipment reconciliation). Rounding to
// two decimal places happens here and nowhere else.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::pricing::{
    discount::{AppliedDiscount, DiscountResolver},
    equipment::{EquipmentCharge, EquipmentReconciler, RequestedEquipment},
    error::{EngineResult, PricingError},
    packages::{PackageResolver, SelectedPackage},
    rules::{MatchCriteria, PricingRule, RuleMatcher},
    types::{round_money, PricingMode},
};

/// Everything the engine needs to price one booth
#[derive(Debug, Clone)]
pub struct BookingContext {
    pub exhibition_id: i32,
    pub booth_size: Decimal,
    /// Exhibition default or manually entered rate; unused in package mode
    pub price_per_sqm: Decimal,
    pub registration_date: DateTime<Utc>,
    pub participant_count: u32,
    pub mode: PricingMode,
    pub selected_packages: Vec<SelectedPackage>,
    pub requested_equipment: Vec<RequestedEquipment>,
}

/// Quote for per-square-metre pricing
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IndividualQuote {
    pub booth_size: Decimal,
    pub price_per_sqm: Decimal,
    pub base_price: Decimal,
    pub applied_discounts: Vec<AppliedDiscount>,
    pub discount_amount: Decimal,
    pub additional_equipment_cost: Decimal,
    pub equipment_charges: Vec<EquipmentCharge>,
    pub final_price: Decimal,
}

/// Quote for package pricing
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PackageQuote {
    pub total_area: Decimal,
    pub total_package_price: Decimal,
    pub additional_equipment_cost: Decimal,
    pub equipment_charges: Vec<EquipmentCharge>,
    pub final_price: Decimal,
}

/// Successful pricing result, tagged by the path that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PriceQuote {
    Individual(IndividualQuote),
    Package(PackageQuote),
}

impl PriceQuote {
    pub fn final_price(&self) -> Decimal {
        match self {
            PriceQuote::Individual(quote) => quote.final_price,
            PriceQuote::Package(quote) => quote.final_price,
        }
    }

    pub fn mode(&self) -> PricingMode {
        match self {
            PriceQuote::Individual(_) => PricingMode::Individual,
            PriceQuote::Package(_) => PricingMode::Package,
        }
    }
}

/// Price a booth
///
/// `rules` is the exhibition's rule set as fetched by the caller; the
/// matcher decides which of them apply. Returns `InvalidBoothSize` or
/// `InvalidPrice` instead of a price when individual pricing is not
/// computable, and `AmountOutOfRange` when an intermediate amount leaves
/// the decimal range.
pub fn compute_price(context: &BookingContext, rules: &[PricingRule]) -> EngineResult<PriceQuote> {
    match context.mode {
        PricingMode::Individual => price_individual(context, rules).map(PriceQuote::Individual),
        PricingMode::Package => price_packages(context).map(PriceQuote::Package),
    }
}

fn price_individual(context: &BookingContext, rules: &[PricingRule]) -> EngineResult<IndividualQuote> {
    if context.booth_size <= Decimal::ZERO {
        return Err(PricingError::InvalidBoothSize);
    }
    if context.price_per_sqm <= Decimal::ZERO {
        return Err(PricingError::InvalidPrice);
    }

    let base_price = context
        .booth_size
        .checked_mul(context.price_per_sqm)
        .ok_or(PricingError::AmountOutOfRange("base price"))?;

    let criteria = MatchCriteria {
        registration_date: context.registration_date,
        booth_size: context.booth_size,
        participant_count: context.participant_count,
    };
    let matched = RuleMatcher::match_rules(rules, &criteria);
    let resolution = DiscountResolver::resolve(&matched, base_price)?;

    // No packages on this path, so every requested unit is chargeable
    let reconciliation = EquipmentReconciler::reconcile(&context.requested_equipment, &[])?;
    let final_price = checked_total(resolution.final_price, reconciliation.additional_cost)?;

    Ok(IndividualQuote {
        booth_size: context.booth_size,
        price_per_sqm: round_money(context.price_per_sqm),
        base_price: round_money(base_price),
        applied_discounts: resolution
            .applied_discounts
            .into_iter()
            .map(|applied| AppliedDiscount {
                discount_amount: round_money(applied.discount_amount),
                ..applied
            })
            .collect(),
        discount_amount: round_money(resolution.discount_amount),
        additional_equipment_cost: round_money(reconciliation.additional_cost),
        equipment_charges: round_charges(reconciliation.charges),
        final_price: round_money(final_price),
    })
}

fn price_packages(context: &BookingContext) -> EngineResult<PackageQuote> {
    let totals = PackageResolver::resolve(&context.selected_packages)?;
    let reconciliation =
        EquipmentReconciler::reconcile(&context.requested_equipment, &context.selected_packages)?;
    let final_price = checked_total(totals.total_package_price, reconciliation.additional_cost)?;

    Ok(PackageQuote {
        total_area: totals.total_area,
        total_package_price: round_money(totals.total_package_price),
        additional_equipment_cost: round_money(reconciliation.additional_cost),
        equipment_charges: round_charges(reconciliation.charges),
        final_price: round_money(final_price),
    })
}

fn checked_total(price: Decimal, additional_cost: Decimal) -> EngineResult<Decimal> {
    price
        .checked_add(additional_cost)
        .ok_or(PricingError::AmountOutOfRange("final price"))
}

fn round_charges(charges: Vec<EquipmentCharge>) -> Vec<EquipmentCharge> {
    charges
        .into_iter()
        .map(|charge| EquipmentCharge {
            unit_price: round_money(charge.unit_price),
            cost: round_money(charge.cost),
            ..charge
        })
        .collect()
}
