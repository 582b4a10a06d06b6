//! Species and their custom field definitions.
//!
//! Species are shared by every farm. Anyone with a farm can add or edit one,
//! only the user who created a species can delete it. Deleting a species
//! leaves existing animals untouched.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::backend::domain::commands::species::{
    CreateSpeciesCommand, DeleteSpeciesCommand, UpdateSpeciesCommand,
};
use crate::backend::domain::errors::{ServiceError, ServiceResult};
use crate::backend::domain::farm_service::FarmService;
use crate::backend::domain::session::Session;
use crate::backend::storage::Repositories;
use shared::{CustomFieldDefinition, CustomFieldType, Species};

#[derive(Clone)]
pub struct SpeciesService {
    repos: Repositories,
    farm_service: FarmService,
}

impl SpeciesService {
    pub fn new(repos: Repositories, farm_service: FarmService) -> Self {
        Self { repos, farm_service }
    }

    /// All species by name
    pub async fn list_species(&self) -> ServiceResult<Vec<Species>> {
        let mut species = self.repos.species.list().await?;
        species.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(species)
    }

    pub async fn get_species(&self, species_id: &str) -> ServiceResult<Species> {
        self.repos
            .species
            .get(species_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("species", species_id))
    }

    pub async fn create_species(
        &self,
        session: &Session,
        command: CreateSpeciesCommand,
    ) -> ServiceResult<Species> {
        info!("Creating species {:?} for {}", command.name, session.user_id);
        self.farm_service.require_farm(session).await?;

        let now = Utc::now().to_rfc3339();
        let mut species = Species {
            id: String::new(),
            name: validate_name(&command.name)?,
            icon: command.icon.filter(|icon| !icon.is_empty()),
            custom_fields: clean_custom_fields(command.custom_fields),
            created_by: session.user_id.clone(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        species.id = self.repos.species.create(&species).await?;
        Ok(species)
    }

    /// Update name, icon and field definitions; creator and creation time are kept
    pub async fn update_species(
        &self,
        session: &Session,
        command: UpdateSpeciesCommand,
    ) -> ServiceResult<Species> {
        info!("Updating species {} for {}", command.species_id, session.user_id);
        self.get_species(&command.species_id).await?;

        let fields = json!({
            "name": validate_name(&command.name)?,
            "icon": command.icon.filter(|icon| !icon.is_empty()),
            "custom_fields": clean_custom_fields(command.custom_fields),
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.repos.species.merge(&command.species_id, fields).await?;

        self.get_species(&command.species_id).await
    }

    pub async fn delete_species(&self, session: &Session, command: DeleteSpeciesCommand) -> ServiceResult<()> {
        let species = self.get_species(&command.species_id).await?;
        if species.created_by != session.user_id {
            warn!(
                "User {} tried to delete species {} created by {}",
                session.user_id, species.id, species.created_by
            );
            return Err(ServiceError::Forbidden(
                "Only the user who created a species can delete it".to_string(),
            ));
        }

        info!("Deleting species {} ({})", species.id, species.name);
        self.repos.species.delete(&species.id).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Species name cannot be empty"));
    }
    Ok(name.to_string())
}

/// Drop unnamed fields; select options are trimmed and blanks removed.
/// Options are cleared for every other field type.
pub fn clean_custom_fields(fields: Vec<CustomFieldDefinition>) -> Vec<CustomFieldDefinition> {
    fields
        .into_iter()
        .filter_map(|field| {
            let name = field.name.trim().to_string();
            if name.is_empty() {
                return None;
            }
            let options = match field.field_type {
                CustomFieldType::Select => field
                    .options
                    .iter()
                    .map(|option| option.trim().to_string())
                    .filter(|option| !option.is_empty())
                    .collect(),
                _ => Vec::new(),
            };
            Some(CustomFieldDefinition {
                name,
                field_type: field.field_type,
                options,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::commands::farm::SaveFarmCommand;
    use crate::backend::storage::SqliteDocumentStore;
    use std::sync::Arc;

    async fn create_test_service() -> SpeciesService {
        let store = SqliteDocumentStore::init_test().await.expect("Failed to init test DB");
        let repos = Repositories::new(Arc::new(store));
        let farm_service = FarmService::new(repos.clone());
        for user in ["user-1", "user-2"] {
            farm_service
                .save_farm(
                    &Session::new(user, None),
                    SaveFarmCommand {
                        farm_name: format!("Farm of {}", user),
                        location: String::new(),
                    },
                )
                .await
                .unwrap();
        }
        SpeciesService::new(repos, farm_service)
    }

    fn field(name: &str, field_type: CustomFieldType, options: &[&str]) -> CustomFieldDefinition {
        CustomFieldDefinition {
            name: name.to_string(),
            field_type,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn goat_command() -> CreateSpeciesCommand {
        CreateSpeciesCommand {
            name: "Goat".to_string(),
            icon: None,
            custom_fields: vec![
                field("Registration", CustomFieldType::Text, &[]),
                field("Breed", CustomFieldType::Select, &[" Nubian ", "", "Alpine"]),
                field("  ", CustomFieldType::Number, &[]),
            ],
        }
    }

    #[test]
    fn test_clean_custom_fields() {
        let cleaned = clean_custom_fields(goat_command().custom_fields);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[1].options, vec!["Nubian".to_string(), "Alpine".to_string()]);
        assert!(cleaned[0].options.is_empty());
    }

    #[tokio::test]
    async fn test_create_records_creator() {
        let service = create_test_service().await;
        let species = service
            .create_species(&Session::new("user-1", None), goat_command())
            .await
            .unwrap();

        let loaded = service.get_species(&species.id).await.unwrap();
        assert_eq!(loaded.created_by, "user-1");
        assert_eq!(loaded.custom_fields.len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_created_fields() {
        let service = create_test_service().await;
        let species = service
            .create_species(&Session::new("user-1", None), goat_command())
            .await
            .unwrap();

        let updated = service
            .update_species(
                &Session::new("user-2", None),
                UpdateSpeciesCommand {
                    species_id: species.id.clone(),
                    name: "Dairy Goat".to_string(),
                    icon: None,
                    custom_fields: vec![],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Dairy Goat");
        assert_eq!(updated.created_by, "user-1");
        assert_eq!(updated.created_at, species.created_at);
        assert!(updated.custom_fields.is_empty());
    }

    #[tokio::test]
    async fn test_only_creator_may_delete() {
        let service = create_test_service().await;
        let species = service
            .create_species(&Session::new("user-1", None), goat_command())
            .await
            .unwrap();
        let command = DeleteSpeciesCommand {
            species_id: species.id.clone(),
        };

        let denied = service
            .delete_species(&Session::new("user-2", None), command.clone())
            .await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));

        service
            .delete_species(&Session::new("user-1", None), command)
            .await
            .unwrap();
        assert!(matches!(
            service.get_species(&species.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_requires_farm() {
        let service = create_test_service().await;
        let result = service
            .create_species(&Session::new("stranger", None), goat_command())
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
