// Discount Resolver
//
// Applies matched rules as successive markdowns: each rule is evaluated
// against the price already reduced by the rules before it.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pricing::{
    error::{EngineResult, PricingError},
    rules::PricingRule,
    types::RuleType,
};

/// Matched rule with the amount it took off
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AppliedDiscount {
    pub rule_id: Uuid,
    pub rule_name: String,
    pub rule_type: RuleType,
    pub discount_percentage: Option<Decimal>,
    pub fixed_discount_amount: Option<Decimal>,
    pub discount_amount: Decimal,
}

/// Outcome of resolving a rule set against a base price
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountResolution {
    /// Every matched rule in evaluation order, zero-amount ones included
    pub applied_discounts: Vec<AppliedDiscount>,
    /// Sum of the per-rule amounts, which may exceed the base price
    pub discount_amount: Decimal,
    /// Never negative
    pub final_price: Decimal,
}

pub struct DiscountResolver;

impl DiscountResolver {
    /// Resolve matched rules against `base_price`
    ///
    /// Rules run by ascending priority; equal priorities keep their input
    /// order. No rounding happens here. Fails with `AmountOutOfRange` when
    /// the stacked amounts leave the decimal range.
    pub fn resolve(
        matched_rules: &[&PricingRule],
        base_price: Decimal,
    ) -> EngineResult<DiscountResolution> {
        let mut ordered: Vec<&PricingRule> = matched_rules.to_vec();
        // sort_by_key is stable
        ordered.sort_by_key(|rule| rule.priority);

        let mut remaining = base_price;
        let mut applied_discounts = Vec::with_capacity(ordered.len());

        for rule in ordered {
            // Percentages never act on a price that is already exhausted
            let discount_amount = rule
                .discount()
                .amount_for(remaining.max(Decimal::ZERO))
                .ok_or(PricingError::AmountOutOfRange("discount"))?;
            remaining = remaining
                .checked_sub(discount_amount)
                .ok_or(PricingError::AmountOutOfRange("discount total"))?;

            applied_discounts.push(AppliedDiscount {
                rule_id: rule.rule_id,
                rule_name: rule.rule_name.clone(),
                rule_type: rule.rule_type,
                discount_percentage: rule.discount_percentage,
                fixed_discount_amount: rule.fixed_discount_amount,
                discount_amount,
            });
        }

        let discount_amount = base_price
            .checked_sub(remaining)
            .ok_or(PricingError::AmountOutOfRange("discount total"))?;

        Ok(DiscountResolution {
            applied_discounts,
            discount_amount,
            final_price: remaining.max(Decimal::ZERO),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::tests::rule;
    use rust_decimal_macros::dec;

    fn percentage_rule(name: &str, priority: i32, pct: Decimal) -> PricingRule {
        let mut r = rule(name, priority);
        r.discount_percentage = Some(pct);
        r
    }

    fn fixed_rule(name: &str, priority: i32, amount: Decimal) -> PricingRule {
        let mut r = rule(name, priority);
        r.fixed_discount_amount = Some(amount);
        r
    }

    #[test]
    fn test_single_percentage_rule() {
        let early_bird = percentage_rule("early bird", 1, dec!(10));
        let result = DiscountResolver::resolve(&[&early_bird], dec!(2000)).unwrap();

        assert_eq!(result.discount_amount, dec!(200));
        assert_eq!(result.final_price, dec!(1800));
        assert_eq!(result.applied_discounts.len(), 1);
        assert_eq!(result.applied_discounts[0].discount_amount, dec!(200));
    }

    #[test]
    fn test_percentage_then_fixed() {
        let early_bird = percentage_rule("early bird", 1, dec!(10));
        let flat = fixed_rule("flat", 2, dec!(50));
        let result = DiscountResolver::resolve(&[&flat, &early_bird], dec!(2000)).unwrap();

        let amounts: Vec<Decimal> = result
            .applied_discounts
            .iter()
            .map(|d| d.discount_amount)
            .collect();
        assert_eq!(amounts, vec![dec!(200), dec!(50)]);
        assert_eq!(result.final_price, dec!(1750));
        assert_eq!(result.discount_amount, dec!(250));
    }

    #[test]
    fn test_percentages_compound_on_remaining_price() {
        let first = percentage_rule("first", 1, dec!(10));
        let second = percentage_rule("second", 2, dec!(10));
        let result = DiscountResolver::resolve(&[&first, &second], dec!(2000)).unwrap();

        // 2000 -> 1800 -> 1620, not 2000 - 400
        assert_eq!(result.applied_discounts[1].discount_amount, dec!(180));
        assert_eq!(result.final_price, dec!(1620));
    }

    #[test]
    fn test_order_changes_outcome_when_mixed() {
        let pct = percentage_rule("pct", 1, dec!(10));
        let flat = fixed_rule("flat", 2, dec!(100));
        let pct_first = DiscountResolver::resolve(&[&pct, &flat], dec!(1000)).unwrap();

        let pct_late = percentage_rule("pct", 3, dec!(10));
        let flat_first = DiscountResolver::resolve(&[&pct_late, &flat], dec!(1000)).unwrap();

        assert_eq!(pct_first.final_price, dec!(800));
        assert_eq!(flat_first.final_price, dec!(810));
    }

    #[test]
    fn test_equal_priorities_keep_input_order() {
        let a = percentage_rule("a", 1, dec!(50));
        let b = fixed_rule("b", 1, dec!(100));

        let ab = DiscountResolver::resolve(&[&a, &b], dec!(1000)).unwrap();
        let ba = DiscountResolver::resolve(&[&b, &a], dec!(1000)).unwrap();

        assert_eq!(ab.applied_discounts[0].rule_name, "a");
        assert_eq!(ab.final_price, dec!(400));
        assert_eq!(ba.applied_discounts[0].rule_name, "b");
        assert_eq!(ba.final_price, dec!(450));
    }

    #[test]
    fn test_zero_discount_rule_is_still_applied() {
        let empty = rule("label only", 1);
        let result = DiscountResolver::resolve(&[&empty], dec!(500)).unwrap();

        assert_eq!(result.applied_discounts.len(), 1);
        assert_eq!(result.applied_discounts[0].discount_amount, Decimal::ZERO);
        assert_eq!(result.final_price, dec!(500));
    }

    #[test]
    fn test_final_price_floored_at_zero() {
        let big = fixed_rule("big", 1, dec!(3000));
        let pct = percentage_rule("pct", 2, dec!(50));
        let result = DiscountResolver::resolve(&[&big, &pct], dec!(2000)).unwrap();

        assert_eq!(result.final_price, Decimal::ZERO);
        assert_eq!(result.discount_amount, dec!(3000));
        assert_eq!(result.applied_discounts[0].discount_amount, dec!(3000));
        assert_eq!(result.applied_discounts[1].discount_amount, Decimal::ZERO);
    }

    #[test]
    fn test_total_discount_matches_applied_amounts_after_overshoot() {
        let first = fixed_rule("first", 1, dec!(1500));
        let second = fixed_rule("second", 2, dec!(1500));
        let result = DiscountResolver::resolve(&[&first, &second], dec!(2000)).unwrap();

        let applied: Decimal = result
            .applied_discounts
            .iter()
            .map(|d| d.discount_amount)
            .sum();
        assert_eq!(result.discount_amount, dec!(3000));
        assert_eq!(result.discount_amount, applied);
        assert_eq!(result.final_price, Decimal::ZERO);
    }

    #[test]
    fn test_stacked_fixed_discounts_out_of_range() {
        let first = fixed_rule("first", 1, Decimal::MAX);
        let second = fixed_rule("second", 2, Decimal::MAX);
        let err = DiscountResolver::resolve(&[&first, &second], dec!(2000)).unwrap_err();

        assert!(matches!(err, PricingError::AmountOutOfRange(_)));
    }

    #[test]
    fn test_percentage_of_huge_base_out_of_range() {
        let pct = percentage_rule("pct", 1, dec!(50));
        let err = DiscountResolver::resolve(&[&pct], Decimal::MAX).unwrap_err();

        assert_eq!(err.code(), "AMOUNT_OUT_OF_RANGE");
    }

    #[test]
    fn test_no_rules() {
        let result = DiscountResolver::resolve(&[], dec!(750)).unwrap();
        assert!(result.applied_discounts.is_empty());
        assert_eq!(result.discount_amount, Decimal::ZERO);
        assert_eq!(result.final_price, dec!(750));
    }
}
