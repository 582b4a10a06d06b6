//! # REST API for Animals
//!
//! Endpoints for the animal registry, its display cards, parent pickers and
//! per-animal health history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::backend::domain::commands::animals::{
    AnimalListQuery, CreateAnimalCommand, ParentOptionsQuery, UpdateAnimalCommand,
};
use crate::backend::domain::Session;
use crate::backend::io::rest::error::ApiError;
use crate::backend::AppState;
use shared::{AnimalFilter, AnimalRequest};

#[derive(Debug, Deserialize)]
pub struct ParentOptionsParams {
    pub species_id: String,
    pub exclude: Option<String>,
}

/// Animals matching the filter, newest first
pub async fn list_animals(
    State(state): State<AppState>,
    _session: Session,
    Query(filter): Query<AnimalFilter>,
) -> impl IntoResponse {
    info!("GET /api/animals - filter: {:?}", filter);

    match state.animal_service.list_animals(AnimalListQuery { filter }).await {
        Ok(animals) => (StatusCode::OK, Json(animals)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list animals").into_response(),
    }
}

pub async fn list_cards(
    State(state): State<AppState>,
    _session: Session,
    Query(filter): Query<AnimalFilter>,
) -> impl IntoResponse {
    match state.animal_service.list_cards(AnimalListQuery { filter }).await {
        Ok(cards) => (StatusCode::OK, Json(cards)).into_response(),
        Err(e) => ApiError::read(e, "Failed to list animal cards").into_response(),
    }
}

pub async fn parent_options(
    State(state): State<AppState>,
    _session: Session,
    Query(params): Query<ParentOptionsParams>,
) -> impl IntoResponse {
    let query = ParentOptionsQuery {
        species_id: params.species_id,
        exclude_animal_id: params.exclude,
    };
    match state.animal_service.parent_options(query).await {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load parent options").into_response(),
    }
}

pub async fn get_animal(
    State(state): State<AppState>,
    _session: Session,
    Path(animal_id): Path<String>,
) -> impl IntoResponse {
    match state.animal_service.get_animal(&animal_id).await {
        Ok(animal) => (StatusCode::OK, Json(animal)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load animal").into_response(),
    }
}

pub async fn create_animal(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AnimalRequest>,
) -> impl IntoResponse {
    info!("POST /api/animals - request: {:?}", request);

    match state
        .animal_service
        .create_animal(&session, CreateAnimalCommand { request })
        .await
    {
        Ok(animal) => (StatusCode::CREATED, Json(animal)).into_response(),
        Err(e) => ApiError::write(e, "Failed to create animal").into_response(),
    }
}

pub async fn update_animal(
    State(state): State<AppState>,
    session: Session,
    Path(animal_id): Path<String>,
    Json(request): Json<AnimalRequest>,
) -> impl IntoResponse {
    info!("PUT /api/animals/{} - request: {:?}", animal_id, request);

    match state
        .animal_service
        .update_animal(&session, UpdateAnimalCommand { animal_id, request })
        .await
    {
        Ok(animal) => (StatusCode::OK, Json(animal)).into_response(),
        Err(e) => ApiError::write(e, "Failed to update animal").into_response(),
    }
}

pub async fn delete_animal(
    State(state): State<AppState>,
    session: Session,
    Path(animal_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/animals/{}", animal_id);

    match state.animal_service.delete_animal(&session, &animal_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => ApiError::write(e, "Failed to delete animal").into_response(),
    }
}

/// Health records of one animal, most recent first
pub async fn health_history(
    State(state): State<AppState>,
    _session: Session,
    Path(animal_id): Path<String>,
) -> impl IntoResponse {
    match state.animal_service.health_history(&animal_id).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => ApiError::read(e, "Failed to load health history").into_response(),
    }
}
