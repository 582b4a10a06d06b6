//! # REST API for Debt Accounts
//!
//! Endpoints for the account list, live summaries and promotion projections.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::backend::domain::commands::accounts::{
    ProjectPromotionCommand, SaveAccountsCommand, SummarizeAccountsCommand,
};
use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;
use crate::backend::AppState;
use shared::{ProjectionRequest, SaveAccountsRequest, SummarizeAccountsRequest};

/// Stored accounts with summary and projections
pub async fn load_accounts(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    info!("GET /api/accounts - user: {}", session.user_id);

    match state.account_service.load_accounts(&session).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load accounts").into_response(),
    }
}

/// Replace the account list
pub async fn save_accounts(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SaveAccountsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/accounts - {} rows", request.accounts.len());

    let command = SaveAccountsCommand {
        accounts: request.accounts,
    };
    match state.account_service.save_accounts(&session, command).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::write(e, "Failed to save accounts").into_response(),
    }
}

/// Summary of unsaved rows
pub async fn summarize_accounts(
    State(state): State<AppState>,
    _session: Session,
    Json(request): Json<SummarizeAccountsRequest>,
) -> impl IntoResponse {
    let command = SummarizeAccountsCommand {
        accounts: request.accounts,
    };
    Json(state.account_service.summarize_accounts(command))
}

pub async fn project_promotion(
    State(state): State<AppState>,
    _session: Session,
    Json(request): Json<ProjectionRequest>,
) -> impl IntoResponse {
    let command = ProjectPromotionCommand {
        balance: request.balance,
        end_date: request.end_date,
    };
    Json(state.account_service.project_promotion(command))
}
