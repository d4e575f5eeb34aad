//! Intake recording service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_gross_weight, validate_source, IntakeRecord, IntakeStatus, PaginatedResponse,
    Pagination, PaginationMeta,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::store::IntakeRepository;

/// Intake service for recording produce deliveries
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn IntakeRepository>,
}

/// Input for recording an intake
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntakeInput {
    #[validate(length(min = 1, max = 200, message = "Source must be 1-200 characters"))]
    pub source: String,
    #[validate(length(max = 120, message = "Produce must be at most 120 characters"))]
    pub produce: Option<String>,
    pub total_gross_weight_kg: Decimal,
    /// Defaults to the time of the request
    pub received_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn IntakeRepository>) -> Self {
        Self { store }
    }

    /// Record a new intake
    pub async fn create_intake(&self, input: CreateIntakeInput) -> AppResult<IntakeRecord> {
        input.validate()?;
        validate_source(&input.source).map_err(|e| AppError::validation("source", e))?;
        validate_gross_weight(input.total_gross_weight_kg)
            .map_err(|e| AppError::validation("total_gross_weight_kg", e))?;

        let intake = IntakeRecord {
            id: Uuid::new_v4(),
            source: input.source.trim().to_string(),
            produce: input.produce,
            total_gross_weight_kg: input.total_gross_weight_kg,
            status: IntakeStatus::Pending,
            received_at: input.received_at.unwrap_or_else(Utc::now),
            notes: input.notes,
        };

        let intake = self.store.insert_intake(intake).await?;
        tracing::info!(
            intake_id = %intake.id,
            source = %intake.source,
            total_kg = %intake.total_gross_weight_kg,
            "Intake recorded"
        );
        Ok(intake)
    }

    /// Get intake by ID
    pub async fn get_intake(&self, intake_id: Uuid) -> AppResult<IntakeRecord> {
        self.store
            .get_intake(intake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Intake".to_string()))
    }

    /// List intakes, newest first
    pub async fn list_intakes(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<IntakeRecord>> {
        let pagination = pagination.normalized();
        let data = self.store.list_intakes(&pagination).await?;
        let total_items = self.store.count_intakes().await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total_items),
        })
    }
}
