//! Intake weight reconciliation
//!
//! A sorting session splits one intake into graded outputs (A, B, Rejected, ...).
//! Before the split is accepted the graded weights must account for the intake's
//! gross weight: `|total - Σ parts| < tolerance`. The check is pure and cheap, so
//! forms run it on every change and the backend runs it again on submit.
//!
//! Two input modes exist:
//! - typed decimals ([`reconcile`], [`WeightReconciler::reconcile_allocation`]),
//! - raw form strings ([`WeightReconciler::reconcile_form`]), where blank or
//!   malformed entries contribute zero and malformed ones are reported back.

use std::borrow::Borrow;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::GradeWeight;

/// Allowed absolute discrepancy between intake weight and graded outputs
pub const DEFAULT_TOLERANCE_KG: Decimal = Decimal::ONE;

/// Outcome of comparing graded weights against an intake total
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reconciliation {
    /// Sum of all graded weights
    pub sum: Decimal,
    /// `total - sum`; positive when weight is still unaccounted for
    pub remainder: Decimal,
    /// `|remainder| < tolerance`
    pub balanced: bool,
    pub tolerance: Decimal,
}

impl Reconciliation {
    pub fn status(&self) -> ReconciliationStatus {
        if self.balanced {
            ReconciliationStatus::Balanced
        } else if self.remainder.is_sign_positive() {
            ReconciliationStatus::Short
        } else {
            ReconciliationStatus::Over
        }
    }

    /// Absolute discrepancy, for display
    pub fn discrepancy(&self) -> Decimal {
        self.remainder.abs()
    }
}

/// Indicator shown next to a sorting form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Balanced,
    /// Graded outputs weigh less than the intake
    Short,
    /// Graded outputs weigh more than the intake
    Over,
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationStatus::Balanced => write!(f, "Balanced"),
            ReconciliationStatus::Short => write!(f, "Short"),
            ReconciliationStatus::Over => write!(f, "Over"),
        }
    }
}

/// Reconcile graded weights against an intake total.
///
/// `sum` and `remainder` are exact. An empty set of parts sums to zero.
/// Negative parts are not rejected here; see [`crate::validate_grade_weights`].
///
/// If the sum or remainder leaves the `Decimal` range the figures are clamped
/// for display and the result is never balanced.
pub fn reconcile<I>(total: Decimal, parts: I, tolerance: Decimal) -> Reconciliation
where
    I: IntoIterator,
    I::Item: Borrow<Decimal>,
{
    let mut overflowed = false;
    let sum = parts.into_iter().fold(Decimal::ZERO, |acc, part| {
        let part = *part.borrow();
        acc.checked_add(part).unwrap_or_else(|| {
            overflowed = true;
            acc.saturating_add(part)
        })
    });
    let remainder = total.checked_sub(sum).unwrap_or_else(|| {
        overflowed = true;
        total.saturating_sub(sum)
    });

    Reconciliation {
        sum,
        remainder,
        balanced: !overflowed && remainder.abs() < tolerance,
        tolerance,
    }
}

/// Rejected form entry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeightInputError {
    #[error("'{raw}' is not a valid weight")]
    Invalid { raw: String },

    #[error("Weight cannot be negative: {value}")]
    Negative { value: Decimal },
}

/// Parse a form entry, telling "not entered yet" apart from "invalid".
///
/// Blank input yields `Ok(None)`.
pub fn parse_weight_entry(raw: &str) -> Result<Option<Decimal>, WeightInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = Decimal::from_str(trimmed).map_err(|_| WeightInputError::Invalid {
        raw: trimmed.to_string(),
    })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(WeightInputError::Negative { value });
    }

    Ok(Some(value))
}

/// Lenient form coercion: blank or unparsable input counts as zero.
/// Negative numbers pass through unchanged.
pub fn coerce_weight(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or(Decimal::ZERO)
}

/// Form-mode result: the reconciliation plus grades whose entry was rejected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormReconciliation {
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    pub status: ReconciliationStatus,
    pub invalid_grades: Vec<String>,
}

impl FormReconciliation {
    /// A form may be submitted only when balanced and free of invalid entries
    pub fn can_submit(&self) -> bool {
        self.reconciliation.balanced && self.invalid_grades.is_empty()
    }
}

/// Reconciliation with a fixed tolerance, shared by every sorting form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightReconciler {
    tolerance: Decimal,
}

impl Default for WeightReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_KG)
    }
}

impl WeightReconciler {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    pub fn reconcile<I>(&self, total: Decimal, parts: I) -> Reconciliation
    where
        I: IntoIterator,
        I::Item: Borrow<Decimal>,
    {
        reconcile(total, parts, self.tolerance)
    }

    pub fn reconcile_allocation(&self, total: Decimal, grades: &[GradeWeight]) -> Reconciliation {
        self.reconcile(total, grades.iter().map(|g| g.weight_kg))
    }

    /// Reconcile raw `(grade, entry)` pairs as typed into a form
    pub fn reconcile_form<L, R>(&self, total: Decimal, entries: &[(L, R)]) -> FormReconciliation
    where
        L: AsRef<str>,
        R: AsRef<str>,
    {
        let invalid_grades = entries
            .iter()
            .filter(|(_, raw)| parse_weight_entry(raw.as_ref()).is_err())
            .map(|(grade, _)| grade.as_ref().to_string())
            .collect();

        let reconciliation =
            self.reconcile(total, entries.iter().map(|(_, raw)| coerce_weight(raw.as_ref())));

        FormReconciliation {
            status: reconciliation.status(),
            reconciliation,
            invalid_grades,
        }
    }
}
