//! In-process repository used for development and tests

use std::collections::HashMap;

use async_trait::async_trait;
use shared::{IntakeRecord, IntakeStatus, Pagination, SortingAllocation};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::IntakeRepository;
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct MemoryState {
    intakes: HashMap<Uuid, IntakeRecord>,
    allocations: HashMap<Uuid, SortingAllocation>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntakeRepository for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_intake(&self, intake: IntakeRecord) -> AppResult<IntakeRecord> {
        let mut state = self.state.write().await;
        if state.intakes.contains_key(&intake.id) {
            return Err(AppError::validation("id", "Intake already exists"));
        }
        state.intakes.insert(intake.id, intake.clone());
        Ok(intake)
    }

    async fn get_intake(&self, id: Uuid) -> AppResult<Option<IntakeRecord>> {
        Ok(self.state.read().await.intakes.get(&id).cloned())
    }

    async fn list_intakes(&self, pagination: &Pagination) -> AppResult<Vec<IntakeRecord>> {
        let state = self.state.read().await;
        let mut intakes: Vec<IntakeRecord> = state.intakes.values().cloned().collect();
        intakes.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
        Ok(intakes.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_intakes(&self) -> AppResult<u64> {
        Ok(self.state.read().await.intakes.len() as u64)
    }

    async fn record_allocation(
        &self,
        allocation: SortingAllocation,
    ) -> AppResult<SortingAllocation> {
        let mut state = self.state.write().await;

        let intake = state
            .intakes
            .get_mut(&allocation.intake_id)
            .ok_or_else(|| AppError::NotFound("Intake".to_string()))?;

        if intake.status == IntakeStatus::Sorted {
            return Err(AppError::InvalidStateTransition(format!(
                "Intake {} is already sorted",
                intake.id
            )));
        }
        intake.status = IntakeStatus::Sorted;

        state
            .allocations
            .insert(allocation.intake_id, allocation.clone());
        Ok(allocation)
    }

    async fn get_allocation(&self, intake_id: Uuid) -> AppResult<Option<SortingAllocation>> {
        Ok(self.state.read().await.allocations.get(&intake_id).cloned())
    }
}
