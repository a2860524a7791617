// Validation utilities module
// Custom validator functions for decimal pricing fields. Limits mirror the
// NUMERIC columns the values are stored in, so anything accepted here is
// stored without rounding or overflow.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Decimal places kept by every money, area and percentage column
const STORED_SCALE: u32 = 2;

fn max_with_cents(integer_digits: u32) -> Decimal {
    // 10^digits - 0.01, e.g. 9_999_999_999.99 for NUMERIC(12,2)
    Decimal::from(10u64.pow(integer_digits)) - Decimal::new(1, STORED_SCALE)
}

fn has_stored_scale(value: &Decimal) -> bool {
    value.normalize().scale() <= STORED_SCALE
}

/// Validates that a percentage lies in [0, 100] with at most two decimals
pub fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        Err(ValidationError::new("percentage_out_of_range"))
    } else if !has_stored_scale(value) {
        Err(ValidationError::new("too_many_decimal_places"))
    } else {
        Ok(())
    }
}

/// Validates a non-negative currency amount that fits NUMERIC(12,2)
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        Err(ValidationError::new("amount_must_not_be_negative"))
    } else if *value > max_with_cents(10) {
        Err(ValidationError::new("amount_too_large"))
    } else if !has_stored_scale(value) {
        Err(ValidationError::new("too_many_decimal_places"))
    } else {
        Ok(())
    }
}

/// Validates a strictly positive area that fits NUMERIC(10,2)
pub fn validate_area(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        Err(ValidationError::new("value_must_be_positive"))
    } else if *value > max_with_cents(8) {
        Err(ValidationError::new("area_too_large"))
    } else if !has_stored_scale(value) {
        Err(ValidationError::new("too_many_decimal_places"))
    } else {
        Ok(())
    }
}
