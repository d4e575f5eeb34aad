//! Validation utilities for intake and sorting data

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::models::{grade_key, GradeWeight};

// ============================================================================
// Weight Bounds
// ============================================================================

/// Decimal places kept for stored weights (gram precision)
pub const MAX_WEIGHT_SCALE: u32 = 3;

/// Largest weight a record can hold: 99,999,999,999.999 kg
pub const MAX_WEIGHT_KG: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 3);

/// Validate a weight fits the stored precision and range
pub fn validate_weight_bounds(weight: Decimal) -> Result<(), &'static str> {
    if weight.abs() > MAX_WEIGHT_KG {
        return Err("Weight exceeds 99,999,999,999.999 kg");
    }
    if weight.normalize().scale() > MAX_WEIGHT_SCALE {
        return Err("Weight can have at most 3 decimal places");
    }
    Ok(())
}

// ============================================================================
// Intake Validations
// ============================================================================

/// Validate intake gross weight is not negative and fits stored bounds
pub fn validate_gross_weight(total: Decimal) -> Result<(), &'static str> {
    if total < Decimal::ZERO {
        return Err("Gross weight cannot be negative");
    }
    validate_weight_bounds(total)
}

/// Validate an intake source reference
pub fn validate_source(source: &str) -> Result<(), &'static str> {
    if source.trim().is_empty() {
        return Err("Source is required");
    }
    Ok(())
}

// ============================================================================
// Sorting Validations
// ============================================================================

/// Validate reconciliation tolerance is strictly positive and fits stored bounds
pub fn validate_tolerance(tolerance: Decimal) -> Result<(), &'static str> {
    if tolerance <= Decimal::ZERO {
        return Err("Tolerance must be greater than zero");
    }
    validate_weight_bounds(tolerance)
}

/// Validate grade weights before an allocation is accepted
pub fn validate_grade_weights(grades: &[GradeWeight]) -> Result<(), &'static str> {
    if grades.is_empty() {
        return Err("At least one grade weight is required");
    }

    let mut seen = HashSet::new();
    for g in grades {
        let label = g.grade.trim();
        if label.is_empty() {
            return Err("Grade label cannot be blank");
        }
        if !seen.insert(grade_key(label)) {
            return Err("Grade labels must be unique");
        }
        if g.weight_kg < Decimal::ZERO {
            return Err("Grade weights cannot be negative");
        }
        validate_weight_bounds(g.weight_kg)?;
    }
    Ok(())
}
