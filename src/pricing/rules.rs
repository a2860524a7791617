// Pricing rules and the rule matcher
//
// A rule is eligible for a booking when it is active and the registration
// date, booth area and participant count all fall inside its bounds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{
    error::{EngineResult, PricingError},
    types::{Discount, RuleType},
};
use crate::validation::{validate_non_negative_amount, validate_percentage, validate_area};

/// Discount rule belonging to one exhibition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PricingRule {
    pub rule_id: Uuid,
    pub exhibition_id: i32,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub discount_percentage: Option<Decimal>,
    pub fixed_discount_amount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_area_sqm: Option<Decimal>,
    pub max_area_sqm: Option<Decimal>,
    pub min_participants: Option<i32>,
    /// Evaluation order, 1 is evaluated first
    pub priority: i32,
    pub is_active: bool,
}

impl PricingRule {
    /// Build a rule from a validated definition
    pub fn from_definition(rule_id: Uuid, exhibition_id: i32, definition: RuleDefinition) -> Self {
        Self {
            rule_id,
            exhibition_id,
            rule_name: definition.rule_name,
            rule_type: definition.rule_type,
            discount_percentage: definition.discount_percentage,
            fixed_discount_amount: definition.fixed_discount_amount,
            start_date: definition.start_date,
            end_date: definition.end_date,
            min_area_sqm: definition.min_area_sqm,
            max_area_sqm: definition.max_area_sqm,
            min_participants: definition.min_participants,
            priority: definition.priority,
            is_active: definition.is_active,
        }
    }

    /// Discount view used during evaluation
    pub fn discount(&self) -> Discount {
        Discount::from_fields(self.discount_percentage, self.fixed_discount_amount)
    }
}

/// Payload for creating or replacing a pricing rule
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RuleDefinition {
    #[validate(length(min = 1, max = 255, message = "Rule name must be 1-255 characters"))]
    pub rule_name: String,
    pub rule_type: RuleType,
    #[validate(custom = "validate_percentage")]
    pub discount_percentage: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub fixed_discount_amount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(custom = "validate_area")]
    pub min_area_sqm: Option<Decimal>,
    #[validate(custom = "validate_area")]
    pub max_area_sqm: Option<Decimal>,
    #[validate(range(min = 1, message = "min_participants must be at least 1"))]
    pub min_participants: Option<i32>,
    #[validate(range(min = 1, message = "Priority must be at least 1"))]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleDefinition {
    /// Field validation plus the cross-field bound checks
    pub fn check(&self) -> EngineResult<()> {
        self.validate()
            .map_err(|e| PricingError::InvalidPricingRule(e.to_string()))?;

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(PricingError::InvalidPricingRule(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_area_sqm, self.max_area_sqm) {
            if min > max {
                return Err(PricingError::InvalidPricingRule(
                    "min_area_sqm must not exceed max_area_sqm".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Booking attributes a rule is matched against
#[derive(Debug, Clone, Copy)]
pub struct MatchCriteria {
    pub registration_date: DateTime<Utc>,
    pub booth_size: Decimal,
    pub participant_count: u32,
}

/// Rule Matcher
///
/// Stateless filter over a rule set; all bounds are inclusive and an absent
/// bound never excludes.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Check a single rule against the booking
    pub fn is_applicable(rule: &PricingRule, criteria: &MatchCriteria) -> bool {
        if !rule.is_active {
            return false;
        }

        if let Some(start) = rule.start_date {
            if criteria.registration_date < start {
                return false;
            }
        }
        if let Some(end) = rule.end_date {
            if criteria.registration_date > end {
                return false;
            }
        }

        if let Some(min_area) = rule.min_area_sqm {
            if criteria.booth_size < min_area {
                return false;
            }
        }
        if let Some(max_area) = rule.max_area_sqm {
            if criteria.booth_size > max_area {
                return false;
            }
        }

        if let Some(min_participants) = rule.min_participants {
            if i64::from(criteria.participant_count) < i64::from(min_participants) {
                return false;
            }
        }

        true
    }

    /// Rules applicable to the booking, in their original order
    pub fn match_rules<'a>(rules: &'a [PricingRule], criteria: &MatchCriteria) -> Vec<&'a PricingRule> {
        rules
            .iter()
            .filter(|rule| Self::is_applicable(rule, criteria))
            .collect()
    }
}
