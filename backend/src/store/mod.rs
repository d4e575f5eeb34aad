//! Repository boundary for intakes and sorting allocations
//!
//! Services depend on [`IntakeRepository`] only, so the reconciliation rules do
//! not change with the storage backend.

use async_trait::async_trait;
use shared::{IntakeRecord, Pagination, SortingAllocation};
use uuid::Uuid;

use crate::error::AppResult;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait IntakeRepository: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    /// Whether the backing store is reachable
    async fn ping(&self) -> bool {
        true
    }

    async fn insert_intake(&self, intake: IntakeRecord) -> AppResult<IntakeRecord>;

    async fn get_intake(&self, id: Uuid) -> AppResult<Option<IntakeRecord>>;

    /// Intakes ordered newest first
    async fn list_intakes(&self, pagination: &Pagination) -> AppResult<Vec<IntakeRecord>>;

    async fn count_intakes(&self) -> AppResult<u64>;

    /// Persist an allocation and mark its intake sorted in one step.
    ///
    /// Fails with `NotFound` for an unknown intake and `InvalidStateTransition`
    /// when the intake already has an allocation.
    async fn record_allocation(&self, allocation: SortingAllocation)
        -> AppResult<SortingAllocation>;

    async fn get_allocation(&self, intake_id: Uuid) -> AppResult<Option<SortingAllocation>>;
}
