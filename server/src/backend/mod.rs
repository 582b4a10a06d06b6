//! # Backend Module
//!
//! Everything behind the HTTP boundary of the homestead server.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (Document store on SQLite)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize the store and the application state from [`AppConfig`]
//! - Set up the REST API router with CORS and request tracing

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::backend::config::AppConfig;
use crate::backend::domain::{
    AccountService, AnimalService, Clock, FarmService, HealthService, LocalClock, PaycheckService,
    SpeciesService,
};
use crate::backend::io::rest::{
    account_apis, animal_apis, farm_apis, health_apis, paycheck_apis,
};
use crate::backend::storage::{DocumentStore, Repositories, SqliteDocumentStore};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub paycheck_service: PaycheckService,
    pub farm_service: FarmService,
    pub species_service: SpeciesService,
    pub animal_service: AnimalService,
    pub health_service: HealthService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, excluded_vendor: &str) -> Self {
        let repos = Repositories::new(store);
        let farm_service = FarmService::new(repos.clone());

        Self {
            account_service: AccountService::new(repos.clone(), clock.clone(), excluded_vendor),
            paycheck_service: PaycheckService::new(repos.clone()),
            species_service: SpeciesService::new(repos.clone(), farm_service.clone()),
            animal_service: AnimalService::new(repos.clone(), farm_service.clone(), clock.clone()),
            health_service: HealthService::new(repos, farm_service.clone(), clock),
            farm_service,
        }
    }
}

/// Create the parent directory of a file-backed SQLite URL
fn ensure_database_directory(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    Ok(())
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    ensure_database_directory(&config.database_url)?;
    let store = SqliteDocumentStore::new(&config.database_url).await?;

    info!("Setting up domain model");
    Ok(AppState::new(Arc::new(store), Arc::new(LocalClock), &config.excluded_vendor))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Budget
        .route(
            "/accounts",
            get(account_apis::load_accounts).put(account_apis::save_accounts),
        )
        .route("/accounts/summary", post(account_apis::summarize_accounts))
        .route("/promotions/projection", post(account_apis::project_promotion))
        .route(
            "/paycheck",
            get(paycheck_apis::load_paycheck).put(paycheck_apis::save_paycheck),
        )
        .route("/paycheck/breakdown", post(paycheck_apis::preview_paycheck))
        // Farm
        .route("/farm", get(farm_apis::get_farm).put(farm_apis::save_farm))
        .route("/farm/stats", get(farm_apis::farm_stats))
        .route("/farms", get(farm_apis::list_farms))
        .route(
            "/species",
            get(farm_apis::list_species).post(farm_apis::create_species),
        )
        .route(
            "/species/:id",
            get(farm_apis::get_species)
                .put(farm_apis::update_species)
                .delete(farm_apis::delete_species),
        )
        .route(
            "/animals",
            get(animal_apis::list_animals).post(animal_apis::create_animal),
        )
        .route("/animals/cards", get(animal_apis::list_cards))
        .route("/animals/parents", get(animal_apis::parent_options))
        .route(
            "/animals/:id",
            get(animal_apis::get_animal)
                .put(animal_apis::update_animal)
                .delete(animal_apis::delete_animal),
        )
        .route("/animals/:id/health", get(animal_apis::health_history))
        // Health
        .route(
            "/health/records",
            get(health_apis::list_records).post(health_apis::create_record),
        )
        .route(
            "/health/records/:id",
            get(health_apis::get_record)
                .put(health_apis::update_record)
                .delete(health_apis::delete_record),
        )
        .route(
            "/health/tasks",
            get(health_apis::list_tasks).post(health_apis::schedule_task),
        )
        .route(
            "/health/tasks/:id",
            get(health_apis::get_task)
                .put(health_apis::update_task)
                .delete(health_apis::delete_task),
        )
        .route("/health/tasks/:id/complete", post(health_apis::complete_task))
        .route("/health/bulk", post(health_apis::bulk_create))
        .route("/health/dashboard", get(health_apis::dashboard))
        .route("/health/withdrawal", post(health_apis::calculate_withdrawal))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, cross-origin requests are disabled", cors_origin);
            cors
        }
    };

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
