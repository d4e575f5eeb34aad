//! Route definitions for the horticulture operations server

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Stateless reconciliation for forms without a stored intake
        .route("/reconcile", post(handlers::reconcile))
        .nest("/intakes", intake_routes())
}

/// Intake and sorting routes
fn intake_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_intakes).post(handlers::create_intake))
        .route("/:intake_id", get(handlers::get_intake))
        .route(
            "/:intake_id/sorting",
            get(handlers::get_sorting).post(handlers::submit_sorting),
        )
        .route("/:intake_id/sorting/preview", post(handlers::preview_sorting))
}
