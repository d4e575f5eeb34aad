//! HTTP handlers for sorting and reconciliation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::sorting::{
        PreviewSortingInput, ReconcileInput, SortingService, SubmitAllocationInput,
    },
    AppState,
};

fn sorting_service(state: &AppState) -> SortingService {
    SortingService::new(
        state.store.clone(),
        state.config.reconciliation.tolerance_kg,
    )
}

/// Reconcile weights without an intake
pub async fn reconcile(
    State(state): State<AppState>,
    Json(input): Json<ReconcileInput>,
) -> AppResult<impl IntoResponse> {
    let result = sorting_service(&state).reconcile(input)?;
    Ok(Json(result))
}

/// Preview a sorting form against an intake
pub async fn preview_sorting(
    State(state): State<AppState>,
    Path(intake_id): Path<Uuid>,
    Json(input): Json<PreviewSortingInput>,
) -> AppResult<impl IntoResponse> {
    let preview = sorting_service(&state).preview(intake_id, input).await?;
    Ok(Json(preview))
}

/// Submit a sorting allocation
pub async fn submit_sorting(
    State(state): State<AppState>,
    Path(intake_id): Path<Uuid>,
    Json(input): Json<SubmitAllocationInput>,
) -> AppResult<impl IntoResponse> {
    let allocation = sorting_service(&state).submit(intake_id, input).await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

/// Get the accepted allocation for an intake
pub async fn get_sorting(
    State(state): State<AppState>,
    Path(intake_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let allocation = sorting_service(&state).get_allocation(intake_id).await?;
    Ok(Json(allocation))
}
