// Domain type definitions for the booth pricing engine
// Shared by the matcher, resolvers and the HTTP layer

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Number of decimal places used for every monetary output
pub const MONEY_SCALE: u32 = 2;

/// Category of a pricing rule
///
/// Informational only: eligibility is decided by the generic date, area and
/// participant filters, never by the rule type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Registration well ahead of the exhibition
    EarlyBird,

    /// Large booths or many participants
    Volume,

    /// Seasonal campaign
    Seasonal,

    /// Registration shortly before the exhibition
    LastMinute,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::EarlyBird => write!(f, "early_bird"),
            RuleType::Volume => write!(f, "volume"),
            RuleType::Seasonal => write!(f, "seasonal"),
            RuleType::LastMinute => write!(f, "last_minute"),
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early_bird" => Ok(RuleType::EarlyBird),
            "volume" => Ok(RuleType::Volume),
            "seasonal" => Ok(RuleType::Seasonal),
            "last_minute" => Ok(RuleType::LastMinute),
            _ => Err(format!("Invalid rule type: {}", s)),
        }
    }
}

/// Pricing path selected for a booth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Per-square-metre pricing with discount rules
    Individual,

    /// Fixed-price packages, no discount rules
    Package,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Individual => write!(f, "individual"),
            PricingMode::Package => write!(f, "package"),
        }
    }
}

/// Markdown carried by a pricing rule
///
/// Built from whichever discount field of the rule is populated; the
/// percentage wins when both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// Percentage of the price remaining when the rule is evaluated
    Percentage(Decimal),

    /// Fixed currency amount
    FixedAmount(Decimal),

    /// Rule matches but takes nothing off
    None,
}

impl Discount {
    pub fn from_fields(percentage: Option<Decimal>, fixed_amount: Option<Decimal>) -> Self {
        match (percentage, fixed_amount) {
            (Some(pct), _) => Discount::Percentage(pct),
            (None, Some(amount)) => Discount::FixedAmount(amount),
            (None, None) => Discount::None,
        }
    }

    /// Amount taken off `remaining_price` by this discount, `None` on overflow
    pub fn amount_for(&self, remaining_price: Decimal) -> Option<Decimal> {
        match self {
            Discount::Percentage(pct) => remaining_price
                .checked_mul(*pct)?
                .checked_div(Decimal::ONE_HUNDRED),
            Discount::FixedAmount(amount) => Some(*amount),
            Discount::None => Some(Decimal::ZERO),
        }
    }
}

/// Round a monetary amount for output
///
/// Half-away-from-zero to two places, rescaled so that `1800` renders as
/// `"1800.00"`.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
