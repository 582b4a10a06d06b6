//! # REST API for the Paycheck

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::backend::domain::commands::paycheck::{PreviewPaycheckCommand, SavePaycheckCommand};
use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;
use crate::backend::AppState;
use shared::PaycheckForm;

pub async fn load_paycheck(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    info!("GET /api/paycheck - user: {}", session.user_id);

    match state.paycheck_service.load_paycheck(&session).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load paycheck").into_response(),
    }
}

pub async fn save_paycheck(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<PaycheckForm>,
) -> impl IntoResponse {
    info!("PUT /api/paycheck - user: {}", session.user_id);

    match state
        .paycheck_service
        .save_paycheck(&session, SavePaycheckCommand { form })
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::write(e, "Failed to save paycheck").into_response(),
    }
}

/// Breakdown of the form as currently edited
pub async fn preview_paycheck(
    State(state): State<AppState>,
    _session: Session,
    Json(form): Json<PaycheckForm>,
) -> impl IntoResponse {
    Json(state.paycheck_service.preview_paycheck(PreviewPaycheckCommand { form }))
}
