//! # REST API for Farms and Species

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use crate::backend::domain::commands::farm::SaveFarmCommand;
use crate::backend::domain::commands::species::{
    CreateSpeciesCommand, DeleteSpeciesCommand, UpdateSpeciesCommand,
};
use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;
use crate::backend::AppState;
use shared::{FarmResponse, SaveFarmRequest, SpeciesRequest};

/// The caller's farm; `farm` is null until one is saved
pub async fn get_farm(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    info!("GET /api/farm - user: {}", session.user_id);

    match state.farm_service.get_farm(&session).await {
        Ok(farm) => (StatusCode::OK, Json(FarmResponse { farm })).into_response(),
        Err(e) => ApiError::read(e, "Failed to load farm").into_response(),
    }
}

pub async fn save_farm(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SaveFarmRequest>,
) -> impl IntoResponse {
    info!("PUT /api/farm - request: {:?}", request);

    let command = SaveFarmCommand {
        farm_name: request.farm_name,
        location: request.location,
    };
    match state.farm_service.save_farm(&session, command).await {
        Ok(farm) => (StatusCode::OK, Json(FarmResponse { farm: Some(farm) })).into_response(),
        Err(e) => ApiError::write(e, "Failed to save farm").into_response(),
    }
}

pub async fn list_farms(State(state): State<AppState>, _session: Session) -> impl IntoResponse {
    match state.farm_service.list_farms().await {
        Ok(farms) => (StatusCode::OK, Json(farms)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list farms").into_response(),
    }
}

pub async fn farm_stats(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    match state.farm_service.farm_stats(&session).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load farm stats").into_response(),
    }
}

pub async fn list_species(State(state): State<AppState>, _session: Session) -> impl IntoResponse {
    match state.species_service.list_species().await {
        Ok(species) => (StatusCode::OK, Json(species)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list species").into_response(),
    }
}

pub async fn get_species(
    State(state): State<AppState>,
    _session: Session,
    Path(species_id): Path<String>,
) -> impl IntoResponse {
    match state.species_service.get_species(&species_id).await {
        Ok(species) => (StatusCode::OK, Json(species)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load species").into_response(),
    }
}

pub async fn create_species(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SpeciesRequest>,
) -> impl IntoResponse {
    info!("POST /api/species - request: {:?}", request);

    let command = CreateSpeciesCommand {
        name: request.name,
        icon: request.icon,
        custom_fields: request.custom_fields,
    };
    match state.species_service.create_species(&session, command).await {
        Ok(species) => (StatusCode::CREATED, Json(species)).into_response(),
        Err(e) => ApiError::write(e, "Failed to create species").into_response(),
    }
}

pub async fn update_species(
    State(state): State<AppState>,
    session: Session,
    Path(species_id): Path<String>,
    Json(request): Json<SpeciesRequest>,
) -> impl IntoResponse {
    info!("PUT /api/species/{} - request: {:?}", species_id, request);

    let command = UpdateSpeciesCommand {
        species_id,
        name: request.name,
        icon: request.icon,
        custom_fields: request.custom_fields,
    };
    match state.species_service.update_species(&session, command).await {
        Ok(species) => (StatusCode::OK, Json(species)).into_response(),
        Err(e) => ApiError::write(e, "Failed to update species").into_response(),
    }
}

pub async fn delete_species(
    State(state): State<AppState>,
    session: Session,
    Path(species_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/species/{}", species_id);

    match state
        .species_service
        .delete_species(&session, DeleteSpeciesCommand { species_id })
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError::write(e, "Failed to delete species").into_response(),
    }
}
