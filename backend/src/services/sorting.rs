//! Sorting service: reconciles graded outputs against an intake and records
//! accepted allocations

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_grade_weights, validate_tolerance, FormEntry, FormReconciliation, GradeWeight,
    Reconciliation, ReconciliationStatus, SortingAllocation, WeightReconciler,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::IntakeRepository;

/// Sorting service for QC and grading flows
#[derive(Clone)]
pub struct SortingService {
    store: Arc<dyn IntakeRepository>,
    reconciler: WeightReconciler,
}

/// Input for a keystroke-mode preview
#[derive(Debug, Default, Deserialize)]
pub struct PreviewSortingInput {
    /// Form rows; an empty list previews the standard grades with blank weights
    #[serde(default)]
    pub entries: Vec<FormEntry>,
}

/// Input for submitting an allocation
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAllocationInput {
    pub grade_weights: Vec<GradeWeight>,
    #[validate(length(min = 1, max = 120, message = "Sorted by must be 1-120 characters"))]
    pub sorted_by: Option<String>,
}

/// Input for a stateless reconciliation
#[derive(Debug, Deserialize)]
pub struct ReconcileInput {
    pub total_kg: Decimal,
    #[serde(default)]
    pub grade_weights: Vec<GradeWeight>,
    /// Overrides the configured tolerance
    pub tolerance_kg: Option<Decimal>,
}

/// Reconciliation with its display status
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResponse {
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    pub status: ReconciliationStatus,
}

impl From<Reconciliation> for ReconcileResponse {
    fn from(reconciliation: Reconciliation) -> Self {
        Self {
            status: reconciliation.status(),
            reconciliation,
        }
    }
}

/// Preview of a sorting form against a stored intake
#[derive(Debug, Clone, Serialize)]
pub struct SortingPreview {
    pub intake_id: Uuid,
    pub total_gross_weight_kg: Decimal,
    /// Grade labels the preview was computed over
    pub grades: Vec<String>,
    #[serde(flatten)]
    pub form: FormReconciliation,
    pub can_submit: bool,
}

impl SortingService {
    pub fn new(store: Arc<dyn IntakeRepository>, tolerance: Decimal) -> Self {
        Self {
            store,
            reconciler: WeightReconciler::new(tolerance),
        }
    }

    /// Reconcile arbitrary weights without touching storage
    pub fn reconcile(&self, input: ReconcileInput) -> AppResult<ReconcileResponse> {
        let reconciler = match input.tolerance_kg {
            Some(tolerance) => {
                validate_tolerance(tolerance)
                    .map_err(|e| AppError::validation("tolerance_kg", e))?;
                WeightReconciler::new(tolerance)
            }
            None => self.reconciler,
        };

        Ok(reconciler
            .reconcile_allocation(input.total_kg, &input.grade_weights)
            .into())
    }

    /// Reconcile raw form entries against an intake. Blank and malformed entries
    /// count as zero; malformed ones are listed in `invalid_grades`.
    pub async fn preview(
        &self,
        intake_id: Uuid,
        input: PreviewSortingInput,
    ) -> AppResult<SortingPreview> {
        let intake = self
            .store
            .get_intake(intake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Intake".to_string()))?;

        let rows = if input.entries.is_empty() {
            FormEntry::standard_rows()
        } else {
            input.entries
        };
        let entries: Vec<(&str, &str)> = rows
            .iter()
            .map(|e| (e.grade.as_str(), e.weight.as_str()))
            .collect();
        let form = self
            .reconciler
            .reconcile_form(intake.total_gross_weight_kg, &entries);

        Ok(SortingPreview {
            intake_id,
            total_gross_weight_kg: intake.total_gross_weight_kg,
            grades: rows.iter().map(|e| e.grade.clone()).collect(),
            can_submit: form.can_submit() && !intake.is_sorted(),
            form,
        })
    }

    /// Accept an allocation for an intake.
    ///
    /// The allocation is recorded only when it balances within tolerance.
    pub async fn submit(
        &self,
        intake_id: Uuid,
        input: SubmitAllocationInput,
    ) -> AppResult<SortingAllocation> {
        input.validate()?;
        validate_grade_weights(&input.grade_weights)
            .map_err(|e| AppError::validation("grade_weights", e))?;

        let intake = self
            .store
            .get_intake(intake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Intake".to_string()))?;

        if intake.is_sorted() {
            return Err(AppError::InvalidStateTransition(format!(
                "Intake {} is already sorted",
                intake_id
            )));
        }

        let reconciliation = self
            .reconciler
            .reconcile_allocation(intake.total_gross_weight_kg, &input.grade_weights);

        if !reconciliation.balanced {
            tracing::warn!(
                intake_id = %intake_id,
                total_kg = %intake.total_gross_weight_kg,
                sum_kg = %reconciliation.sum,
                remainder_kg = %reconciliation.remainder,
                "Rejected unbalanced allocation"
            );
            return Err(AppError::Unbalanced { reconciliation });
        }

        let allocation = SortingAllocation::from_reconciliation(
            intake_id,
            input.grade_weights,
            &reconciliation,
            input.sorted_by,
        );
        let allocation = self.store.record_allocation(allocation).await?;

        tracing::info!(
            intake_id = %intake_id,
            allocation_id = %allocation.id,
            grades = allocation.grade_weights.len(),
            remainder_kg = %allocation.remainder_kg,
            "Sorting allocation recorded"
        );
        Ok(allocation)
    }

    /// Get the accepted allocation for an intake
    pub async fn get_allocation(&self, intake_id: Uuid) -> AppResult<SortingAllocation> {
        self.store
            .get_allocation(intake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sorting allocation".to_string()))
    }
}
