//! Farm profile. Each user owns at most one farm, stored under the user's id.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::backend::domain::commands::farm::SaveFarmCommand;
use crate::backend::domain::errors::{ServiceError, ServiceResult};
use crate::backend::domain::session::Session;
use crate::backend::storage::Repositories;
use shared::{Farm, FarmStats};

#[derive(Clone)]
pub struct FarmService {
    repos: Repositories,
}

impl FarmService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// The caller's farm, if one was saved
    pub async fn get_farm(&self, session: &Session) -> ServiceResult<Option<Farm>> {
        Ok(self.repos.farms.get(&session.user_id).await?)
    }

    /// The caller's farm; creating species or animals needs one
    pub async fn require_farm(&self, session: &Session) -> ServiceResult<Farm> {
        match self.get_farm(session).await? {
            Some(farm) => Ok(farm),
            None => {
                warn!("User {} has no farm", session.user_id);
                Err(ServiceError::validation("No farm found. Please create a farm first."))
            }
        }
    }

    /// Create or update the caller's farm; fields not sent are kept
    pub async fn save_farm(&self, session: &Session, command: SaveFarmCommand) -> ServiceResult<Farm> {
        info!("Saving farm for {}: {:?}", session.user_id, command);

        let farm_name = command.farm_name.trim();
        if farm_name.is_empty() {
            return Err(ServiceError::validation("Farm name cannot be empty"));
        }

        let fields = json!({
            "farm_name": farm_name,
            "location": command.location.trim(),
            "owner_id": session.user_id,
            "email": session.email,
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.repos.farms.merge(&session.user_id, fields).await?;

        self.repos
            .farms
            .get(&session.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("farm", session.user_id.clone()))
    }

    /// Every farm, for owner pickers
    pub async fn list_farms(&self) -> ServiceResult<Vec<Farm>> {
        let mut farms = self.repos.farms.list().await?;
        farms.sort_by(|a, b| a.farm_name.to_lowercase().cmp(&b.farm_name.to_lowercase()));
        Ok(farms)
    }

    /// Number of animals the caller owns
    pub async fn farm_stats(&self, session: &Session) -> ServiceResult<FarmStats> {
        let animals = self.repos.animals.list().await?;
        let total_animals = animals
            .iter()
            .filter(|animal| animal.owner_id == session.user_id)
            .count();
        Ok(FarmStats { total_animals })
    }
}
