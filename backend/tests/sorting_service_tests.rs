//! Sorting service tests
//! Verifies allocations are gated on reconciliation and recorded once per intake

use std::sync::Arc;

use hops_server::{
    services::{
        intake::CreateIntakeInput,
        sorting::{PreviewSortingInput, SubmitAllocationInput},
        IntakeService, SortingService,
    },
    AppError, IntakeRepository, MemoryStore,
};
use rust_decimal::Decimal;
use shared::{FormEntry, GradeWeight, IntakeRecord, IntakeStatus, ReconciliationStatus};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn services(tolerance: &str) -> (IntakeService, SortingService) {
    let store: Arc<dyn IntakeRepository> = Arc::new(MemoryStore::new());
    (
        IntakeService::new(store.clone()),
        SortingService::new(store, dec(tolerance)),
    )
}

fn intake_input(total: &str) -> CreateIntakeInput {
    CreateIntakeInput {
        source: "Ochieng Cooperative".to_string(),
        produce: Some("Avocado".to_string()),
        total_gross_weight_kg: dec(total),
        received_at: None,
        notes: None,
    }
}

fn allocation(weights: &[(&str, &str)]) -> SubmitAllocationInput {
    SubmitAllocationInput {
        grade_weights: weights
            .iter()
            .map(|(grade, kg)| GradeWeight::new(*grade, dec(kg)))
            .collect(),
        sorted_by: None,
    }
}

#[tokio::test]
async fn submit_respects_configured_tolerance() {
    let (intakes, sorting) = services("0.25");
    let intake = intakes.create_intake(intake_input("500")).await.unwrap();

    let err = sorting
        .submit(intake.id, allocation(&[("A", "400"), ("B", "99.7")]))
        .await
        .unwrap_err();
    match err {
        AppError::Unbalanced { reconciliation } => {
            assert_eq!(reconciliation.remainder, dec("0.3"));
            assert_eq!(reconciliation.tolerance, dec("0.25"));
        }
        other => panic!("expected Unbalanced, got {:?}", other),
    }

    let recorded = sorting
        .submit(intake.id, allocation(&[("A", "400"), ("B", "99.8")]))
        .await
        .unwrap();
    assert_eq!(recorded.tolerance_kg, dec("0.25"));
    assert_eq!(recorded.weight_for("b"), Some(dec("99.8")));
}

#[tokio::test]
async fn overweight_allocation_is_rejected() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("100")).await.unwrap();

    let err = sorting
        .submit(intake.id, allocation(&[("A", "80"), ("Rejected", "25")]))
        .await
        .unwrap_err();
    match err {
        AppError::Unbalanced { reconciliation } => {
            assert_eq!(reconciliation.status(), ReconciliationStatus::Over);
        }
        other => panic!("expected Unbalanced, got {:?}", other),
    }
}

#[tokio::test]
async fn negative_grade_weight_is_a_validation_error() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("100")).await.unwrap();

    let err = sorting
        .submit(intake.id, allocation(&[("A", "110"), ("Rejected", "-10")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "grade_weights"));
}

#[tokio::test]
async fn zero_weight_intake_with_zero_grades_balances() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("0")).await.unwrap();

    let recorded = sorting
        .submit(intake.id, allocation(&[("A", "0")]))
        .await
        .unwrap();
    assert_eq!(recorded.sum_kg, Decimal::ZERO);
    assert_eq!(recorded.remainder_kg, Decimal::ZERO);
}

#[tokio::test]
async fn preview_is_disabled_after_sorting() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("10")).await.unwrap();

    let entries = || PreviewSortingInput {
        entries: vec![FormEntry::new("A", "10")],
    };

    let before = sorting.preview(intake.id, entries()).await.unwrap();
    assert!(before.can_submit);

    sorting
        .submit(intake.id, allocation(&[("A", "10")]))
        .await
        .unwrap();

    let after = sorting.preview(intake.id, entries()).await.unwrap();
    assert!(after.form.reconciliation.balanced);
    assert!(!after.can_submit);

    let stored = intakes.get_intake(intake.id).await.unwrap();
    assert_eq!(stored.status, IntakeStatus::Sorted);
}

#[tokio::test]
async fn concurrent_submissions_record_one_allocation() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("10")).await.unwrap();

    let (first, second) = tokio::join!(
        sorting.submit(intake.id, allocation(&[("A", "10")])),
        sorting.submit(intake.id, allocation(&[("A", "6"), ("B", "4")])),
    );

    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
}

#[tokio::test]
async fn blank_source_is_rejected() {
    let (intakes, _) = services("1");
    let mut input = intake_input("10");
    input.source = "   ".to_string();

    let err = intakes.create_intake(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "source"));
}

#[tokio::test]
async fn overflowing_allocation_is_never_recorded() {
    let store: Arc<dyn IntakeRepository> = Arc::new(MemoryStore::new());
    let sorting = SortingService::new(store.clone(), dec("1"));
    // Stored directly, bypassing intake validation
    let intake = store
        .insert_intake(IntakeRecord::new("Legacy import", Decimal::MAX))
        .await
        .unwrap();

    let err = sorting
        .submit(
            intake.id,
            SubmitAllocationInput {
                grade_weights: vec![
                    GradeWeight::new("A", Decimal::MAX),
                    GradeWeight::new("B", Decimal::MAX),
                ],
                sorted_by: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "grade_weights"));

    assert!(matches!(
        sorting.get_allocation(intake.id).await,
        Err(AppError::NotFound(_))
    ));
    let stored = store.get_intake(intake.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IntakeStatus::Pending);
}

#[tokio::test]
async fn empty_preview_lists_standard_grades() {
    let (intakes, sorting) = services("1");
    let intake = intakes.create_intake(intake_input("10")).await.unwrap();

    let preview = sorting
        .preview(intake.id, PreviewSortingInput::default())
        .await
        .unwrap();
    assert_eq!(preview.grades, vec!["A", "B", "Rejected"]);
    assert_eq!(preview.form.reconciliation.sum, Decimal::ZERO);
    assert!(preview.form.invalid_grades.is_empty());
    assert!(!preview.can_submit);
}
