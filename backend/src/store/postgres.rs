//! PostgreSQL repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{GradeWeight, IntakeRecord, IntakeStatus, Pagination, SortingAllocation};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::IntakeRepository;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database row for an intake
#[derive(Debug, sqlx::FromRow)]
struct IntakeRow {
    id: Uuid,
    source: String,
    produce: Option<String>,
    total_gross_weight_kg: Decimal,
    status: String,
    received_at: DateTime<Utc>,
    notes: Option<String>,
}

impl TryFrom<IntakeRow> for IntakeRecord {
    type Error = AppError;

    fn try_from(row: IntakeRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<IntakeStatus>()
            .map_err(AppError::Internal)?;

        Ok(IntakeRecord {
            id: row.id,
            source: row.source,
            produce: row.produce,
            total_gross_weight_kg: row.total_gross_weight_kg,
            status,
            received_at: row.received_at,
            notes: row.notes,
        })
    }
}

/// Database row for a sorting allocation
#[derive(Debug, sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    intake_id: Uuid,
    grade_weights: Json<Vec<GradeWeight>>,
    sum_kg: Decimal,
    remainder_kg: Decimal,
    tolerance_kg: Decimal,
    sorted_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AllocationRow> for SortingAllocation {
    fn from(row: AllocationRow) -> Self {
        SortingAllocation {
            id: row.id,
            intake_id: row.intake_id,
            grade_weights: row.grade_weights.0,
            sum_kg: row.sum_kg,
            remainder_kg: row.remainder_kg,
            tolerance_kg: row.tolerance_kg,
            sorted_by: row.sorted_by,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl IntakeRepository for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }

    async fn insert_intake(&self, intake: IntakeRecord) -> AppResult<IntakeRecord> {
        let row = sqlx::query_as::<_, IntakeRow>(
            r#"
            INSERT INTO intakes (id, source, produce, total_gross_weight_kg, status, received_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, source, produce, total_gross_weight_kg, status, received_at, notes
            "#,
        )
        .bind(intake.id)
        .bind(&intake.source)
        .bind(&intake.produce)
        .bind(intake.total_gross_weight_kg)
        .bind(intake.status.as_str())
        .bind(intake.received_at)
        .bind(&intake.notes)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn get_intake(&self, id: Uuid) -> AppResult<Option<IntakeRecord>> {
        let row = sqlx::query_as::<_, IntakeRow>(
            r#"
            SELECT id, source, produce, total_gross_weight_kg, status, received_at, notes
            FROM intakes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(IntakeRecord::try_from).transpose()
    }

    async fn list_intakes(&self, pagination: &Pagination) -> AppResult<Vec<IntakeRecord>> {
        let rows = sqlx::query_as::<_, IntakeRow>(
            r#"
            SELECT id, source, produce, total_gross_weight_kg, status, received_at, notes
            FROM intakes
            ORDER BY received_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(IntakeRecord::try_from).collect()
    }

    async fn count_intakes(&self) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM intakes")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn record_allocation(
        &self,
        allocation: SortingAllocation,
    ) -> AppResult<SortingAllocation> {
        let mut tx = self.db.begin().await?;

        // Lock the intake row so concurrent submissions serialize
        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM intakes WHERE id = $1 FOR UPDATE",
        )
        .bind(allocation.intake_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Intake".to_string()))?;

        if status != IntakeStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(format!(
                "Intake {} is already sorted",
                allocation.intake_id
            )));
        }

        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            INSERT INTO sorting_allocations
                (id, intake_id, grade_weights, sum_kg, remainder_kg, tolerance_kg, sorted_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, intake_id, grade_weights, sum_kg, remainder_kg, tolerance_kg, sorted_by, created_at
            "#,
        )
        .bind(allocation.id)
        .bind(allocation.intake_id)
        .bind(Json(&allocation.grade_weights))
        .bind(allocation.sum_kg)
        .bind(allocation.remainder_kg)
        .bind(allocation.tolerance_kg)
        .bind(&allocation.sorted_by)
        .bind(allocation.created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE intakes SET status = $1 WHERE id = $2")
            .bind(IntakeStatus::Sorted.as_str())
            .bind(allocation.intake_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn get_allocation(&self, intake_id: Uuid) -> AppResult<Option<SortingAllocation>> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, intake_id, grade_weights, sum_kg, remainder_kg, tolerance_kg, sorted_by, created_at
            FROM sorting_allocations
            WHERE intake_id = $1
            "#,
        )
        .bind(intake_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }
}
