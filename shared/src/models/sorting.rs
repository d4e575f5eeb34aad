//! Sorting allocation models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconcile::Reconciliation;

/// Grade labels offered by default on sorting forms
pub const STANDARD_GRADES: &[&str] = &["A", "B", "Rejected"];

/// Comparison key for grade labels: trimmed, Unicode lowercase
pub fn grade_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// One row of a sorting form as typed by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormEntry {
    pub grade: String,
    /// Raw input; blank when nothing has been entered
    #[serde(default)]
    pub weight: String,
}

impl FormEntry {
    pub fn new(grade: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            grade: grade.into(),
            weight: weight.into(),
        }
    }

    /// Blank rows for the standard grades
    pub fn standard_rows() -> Vec<FormEntry> {
        STANDARD_GRADES
            .iter()
            .map(|grade| FormEntry::new(*grade, ""))
            .collect()
    }
}

/// Weight allocated to one grade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeWeight {
    pub grade: String,
    pub weight_kg: Decimal,
}

impl GradeWeight {
    pub fn new(grade: impl Into<String>, weight_kg: Decimal) -> Self {
        Self {
            grade: grade.into(),
            weight_kg,
        }
    }
}

/// An accepted split of one intake into grades
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortingAllocation {
    pub id: Uuid,
    pub intake_id: Uuid,
    /// Grade weights in the order they were entered
    pub grade_weights: Vec<GradeWeight>,
    pub sum_kg: Decimal,
    pub remainder_kg: Decimal,
    pub tolerance_kg: Decimal,
    pub sorted_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SortingAllocation {
    /// Build an allocation record from a reconciliation that has already passed
    pub fn from_reconciliation(
        intake_id: Uuid,
        grade_weights: Vec<GradeWeight>,
        reconciliation: &Reconciliation,
        sorted_by: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            intake_id,
            grade_weights,
            sum_kg: reconciliation.sum,
            remainder_kg: reconciliation.remainder,
            tolerance_kg: reconciliation.tolerance,
            sorted_by,
            created_at: Utc::now(),
        }
    }

    /// Weight recorded for a grade label, matched by [`grade_key`]
    pub fn weight_for(&self, grade: &str) -> Option<Decimal> {
        let key = grade_key(grade);
        self.grade_weights
            .iter()
            .find(|g| grade_key(&g.grade) == key)
            .map(|g| g.weight_kg)
    }
}
