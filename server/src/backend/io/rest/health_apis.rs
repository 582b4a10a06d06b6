//! # REST API for Animal Health
//!
//! Records, scheduled tasks, bulk actions, the dashboard and the withdrawal
//! calculator.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::backend::domain::commands::health::{
    BulkCreateCommand, CompleteTaskCommand, CreateRecordCommand, DashboardQuery, RecordListQuery,
    ScheduleTaskCommand, TaskListQuery, UpdateRecordCommand, UpdateTaskCommand,
};
use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;
use crate::backend::AppState;
use shared::{
    BulkHealthRequest, CompleteTaskRequest, HealthRecordRequest, HealthTaskRequest,
    WithdrawalCalculationRequest,
};

pub async fn list_records(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<shared::RecordListQuery>,
) -> impl IntoResponse {
    info!("GET /api/health/records - query: {:?}", query);

    let query = RecordListQuery {
        animal_id: query.animal_id,
        species_id: query.species_id,
        event_type: query.event_type,
        scope: query.scope,
    };
    match state.health_service.list_records(&session, query).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list health records").into_response(),
    }
}

pub async fn get_record(
    State(state): State<AppState>,
    _session: Session,
    Path(record_id): Path<String>,
) -> impl IntoResponse {
    match state.health_service.get_record(&record_id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load health record").into_response(),
    }
}

/// Save a record, scheduling its follow-up when one is requested
pub async fn create_record(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<HealthRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/health/records - request: {:?}", request);

    match state
        .health_service
        .create_record(&session, CreateRecordCommand { request })
        .await
    {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::write(e, "Failed to create health record").into_response(),
    }
}

pub async fn update_record(
    State(state): State<AppState>,
    session: Session,
    Path(record_id): Path<String>,
    Json(request): Json<HealthRecordRequest>,
) -> impl IntoResponse {
    info!("PUT /api/health/records/{} - request: {:?}", record_id, request);

    match state
        .health_service
        .update_record(&session, UpdateRecordCommand { record_id, request })
        .await
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => ApiError::write(e, "Failed to update health record").into_response(),
    }
}

pub async fn delete_record(
    State(state): State<AppState>,
    session: Session,
    Path(record_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/health/records/{}", record_id);

    match state.health_service.delete_record(&session, &record_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError::write(e, "Failed to delete health record").into_response(),
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<shared::TaskListQuery>,
) -> impl IntoResponse {
    info!("GET /api/health/tasks - query: {:?}", query);

    let query = TaskListQuery {
        filter: query.filter,
        scope: query.scope,
    };
    match state.health_service.list_tasks(&session, query).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list health tasks").into_response(),
    }
}

pub async fn get_task(
    State(state): State<AppState>,
    _session: Session,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    match state.health_service.get_task(&task_id).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load health task").into_response(),
    }
}

pub async fn schedule_task(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<HealthTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/health/tasks - request: {:?}", request);

    match state
        .health_service
        .schedule_task(&session, ScheduleTaskCommand { request })
        .await
    {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => ApiError::write(e, "Failed to schedule health task").into_response(),
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    Path(task_id): Path<String>,
    Json(request): Json<HealthTaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/health/tasks/{} - request: {:?}", task_id, request);

    match state
        .health_service
        .update_task(&session, UpdateTaskCommand { task_id, request })
        .await
    {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => ApiError::write(e, "Failed to update health task").into_response(),
    }
}

pub async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/health/tasks/{}", task_id);

    match state.health_service.delete_task(&session, &task_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError::write(e, "Failed to delete health task").into_response(),
    }
}

/// Mark a task done, producing its health record
pub async fn complete_task(
    State(state): State<AppState>,
    session: Session,
    Path(task_id): Path<String>,
    Json(request): Json<CompleteTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/health/tasks/{}/complete - request: {:?}", task_id, request);

    match state
        .health_service
        .complete_task(&session, CompleteTaskCommand { task_id, request })
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::write(e, "Failed to complete health task").into_response(),
    }
}

pub async fn bulk_create(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<BulkHealthRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/health/bulk - {:?} for {} animals",
        request.kind,
        request.animal_ids.len()
    );

    match state
        .health_service
        .bulk_create(&session, BulkCreateCommand { request })
        .await
    {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::write(e, "Failed to apply bulk health action").into_response(),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<shared::DashboardQuery>,
) -> impl IntoResponse {
    info!("GET /api/health/dashboard - query: {:?}", query);

    let query = DashboardQuery {
        scope: query.scope,
        filter: query.filter,
    };
    match state.health_service.dashboard(&session, query).await {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load health dashboard").into_response(),
    }
}

pub async fn calculate_withdrawal(
    State(state): State<AppState>,
    _session: Session,
    Json(request): Json<WithdrawalCalculationRequest>,
) -> impl IntoResponse {
    info!("POST /api/health/withdrawal - request: {:?}", request);

    match state.health_service.calculate_withdrawal(request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => ApiError::read(e, "Failed to calculate withdrawal").into_response(),
    }
}
