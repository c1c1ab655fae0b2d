//! API request handlers
//!
//! Handlers are thin: they pull the shared planner out of [`ApiState`], run
//! it synchronously (a request is a handful of tree walks) and wrap the
//! result in the response envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::forecast::ForecastError;
use crate::planner::{DonationPlanner, PlanError, PlanRequest};

/// Shared state for every handler.
#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<DonationPlanner>,
}

impl ApiState {
    pub fn new(planner: DonationPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub items: usize,
    pub training_rows: usize,
    pub centers: usize,
    pub restaurants: usize,
}

/// GET /api/v1/health
pub async fn get_health(State(state): State<ApiState>) -> Response {
    let planner = &state.planner;
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        items: planner.bank().item_count(),
        training_rows: planner.bank().training_rows(),
        centers: planner.directory().centers().len(),
        restaurants: planner.directory().restaurants().len(),
    })
}

/// GET /api/v1/options
pub async fn get_options(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.planner.options())
}

/// POST /api/v1/plan
pub async fn post_plan(
    State(state): State<ApiState>,
    body: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected plan request body");
            return ApiErrorResponse::bad_request(rejection.body_text());
        }
    };

    match state.planner.plan(&request) {
        Ok(report) => {
            info!(
                restaurant = %report.restaurant,
                items = report.items.len(),
                warnings = report.warnings().count(),
                "Plan served"
            );
            ApiResponse::ok(report)
        }
        Err(e) => {
            warn!(error = %e, "Plan request failed");
            if is_client_error(&e) {
                ApiErrorResponse::bad_request(e.to_string())
            } else {
                ApiErrorResponse::internal(e.to_string())
            }
        }
    }
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Response {
    ApiErrorResponse::not_found("No such endpoint")
}

/// Bad selections are the caller's fault; anything else means the loaded
/// model is inconsistent.
fn is_client_error(err: &PlanError) -> bool {
    match err {
        PlanError::UnknownRestaurant(_) | PlanError::NoItemsSelected => true,
        PlanError::Forecast(ForecastError::UnknownLabel { .. } | ForecastError::UnknownItem(_)) => {
            true
        }
        PlanError::Forecast(_) => false,
    }
}
