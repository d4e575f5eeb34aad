//! HTTP handlers for intake recording

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::Pagination;
use uuid::Uuid;

use crate::{
    error::AppResult,
    services::intake::{CreateIntakeInput, IntakeService},
    AppState,
};

/// Record a new intake
pub async fn create_intake(
    State(state): State<AppState>,
    Json(input): Json<CreateIntakeInput>,
) -> AppResult<impl IntoResponse> {
    let service = IntakeService::new(state.store);
    let intake = service.create_intake(input).await?;
    Ok((StatusCode::CREATED, Json(intake)))
}

/// Get intake by ID
pub async fn get_intake(
    State(state): State<AppState>,
    Path(intake_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = IntakeService::new(state.store);
    let intake = service.get_intake(intake_id).await?;
    Ok(Json(intake))
}

/// List intakes
pub async fn list_intakes(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<impl IntoResponse> {
    let service = IntakeService::new(state.store);
    let intakes = service.list_intakes(pagination).await?;
    Ok(Json(intakes))
}
