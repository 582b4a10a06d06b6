//! Animals, their species-specific fields and display projections.
//!
//! ## Business Rules
//!
//! - Creating an animal requires the caller to have a farm; the animal is
//!   owned by that user and, unless told otherwise, by that farm
//! - Custom field values are checked against the species definitions and
//!   stored typed; blank values are left out
//! - Status details only exist for sold, deceased and transferred animals
//! - Listings are newest first

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::animals::{
    AnimalListQuery, CreateAnimalCommand, ParentOptionsQuery, UpdateAnimalCommand,
};
use crate::backend::domain::errors::{ServiceError, ServiceResult};
use crate::backend::domain::farm_service::FarmService;
use crate::backend::domain::session::Session;
use crate::backend::storage::Repositories;
use shared::{
    Animal, AnimalCard, AnimalFilter, AnimalOwner, AnimalRef, AnimalRequest, CustomFieldType,
    CustomFieldValue, Gender, HealthRecord, ParentOptions, Species,
};

#[derive(Clone)]
pub struct AnimalService {
    repos: Repositories,
    farm_service: FarmService,
    clock: Arc<dyn Clock>,
}

impl AnimalService {
    pub fn new(repos: Repositories, farm_service: FarmService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            farm_service,
            clock,
        }
    }

    /// Animals matching the filter, newest first
    pub async fn list_animals(&self, query: AnimalListQuery) -> ServiceResult<Vec<Animal>> {
        let animals = self.repos.animals.list().await?;
        let mut animals: Vec<Animal> = animals
            .into_iter()
            .filter(|animal| matches_filter(animal, &query.filter))
            .collect();
        sort_newest_first(&mut animals);
        Ok(animals)
    }

    pub async fn get_animal(&self, animal_id: &str) -> ServiceResult<Animal> {
        self.repos
            .animals
            .get(animal_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("animal", animal_id))
    }

    pub async fn create_animal(&self, session: &Session, command: CreateAnimalCommand) -> ServiceResult<Animal> {
        info!("Creating animal {:?} for {}", command.request.name, session.user_id);
        let farm = self.farm_service.require_farm(session).await?;

        let mut animal = self.build_animal(command.request, None).await?;
        if animal.owner.is_none() {
            animal.owner = Some(AnimalOwner::Farm(farm.id));
        }
        let now = Utc::now().to_rfc3339();
        animal.owner_id = session.user_id.clone();
        animal.created_at = Some(now.clone());
        animal.updated_at = Some(now);

        animal.id = self.repos.animals.create(&animal).await?;
        Ok(animal)
    }

    /// Replace an animal's details; owner user and creation time are kept
    pub async fn update_animal(&self, session: &Session, command: UpdateAnimalCommand) -> ServiceResult<Animal> {
        info!("Updating animal {} for {}", command.animal_id, session.user_id);
        let existing = self.get_animal(&command.animal_id).await?;

        let mut animal = self.build_animal(command.request, Some(&existing.id)).await?;
        if animal.owner.is_none() {
            animal.owner = existing.owner;
        }
        animal.id = existing.id;
        animal.owner_id = existing.owner_id;
        animal.created_at = existing.created_at;
        animal.updated_at = Some(Utc::now().to_rfc3339());

        self.repos.animals.replace(&animal.id, &animal).await?;
        Ok(animal)
    }

    pub async fn delete_animal(&self, session: &Session, animal_id: &str) -> ServiceResult<()> {
        info!("Deleting animal {} for {}", animal_id, session.user_id);
        if !self.repos.animals.delete(animal_id).await? {
            return Err(ServiceError::not_found("animal", animal_id));
        }
        Ok(())
    }

    /// Display cards for the animals grid
    pub async fn list_cards(&self, query: AnimalListQuery) -> ServiceResult<Vec<AnimalCard>> {
        let animals = self.list_animals(query).await?;
        let species: HashMap<String, String> = self
            .repos
            .species
            .list()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let farms: HashMap<String, String> = self
            .repos
            .farms
            .list()
            .await?
            .into_iter()
            .map(|f| (f.id, f.farm_name))
            .collect();
        let today = self.clock.today();

        Ok(animals
            .into_iter()
            .map(|animal| AnimalCard {
                species_name: species
                    .get(&animal.species_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                owner_name: owner_name(animal.owner.as_ref(), &farms),
                age: animal.birth_date.map(|birth| describe_age(birth, today)),
                id: animal.id,
                name: animal.name,
                gender: animal.gender,
                color: animal.color,
                status: animal.status,
                photo: animal.photo,
            })
            .collect())
    }

    /// Males of the species as sires, females as dams
    pub async fn parent_options(&self, query: ParentOptionsQuery) -> ServiceResult<ParentOptions> {
        let mut animals: Vec<Animal> = self
            .repos
            .animals
            .list()
            .await?
            .into_iter()
            .filter(|animal| animal.species_id == query.species_id)
            .filter(|animal| query.exclude_animal_id.as_deref() != Some(animal.id.as_str()))
            .collect();
        animals.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let to_ref = |animal: &Animal| AnimalRef {
            id: animal.id.clone(),
            name: animal.name.clone(),
        };
        Ok(ParentOptions {
            sires: animals.iter().filter(|a| a.gender == Gender::Male).map(to_ref).collect(),
            dams: animals.iter().filter(|a| a.gender == Gender::Female).map(to_ref).collect(),
        })
    }

    /// Health records of one animal, latest event first
    pub async fn health_history(&self, animal_id: &str) -> ServiceResult<Vec<HealthRecord>> {
        self.get_animal(animal_id).await?;
        let mut records: Vec<HealthRecord> = self
            .repos
            .health_records
            .list()
            .await?
            .into_iter()
            .filter(|record| record.animal_id == animal_id)
            .collect();
        records.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(records)
    }

    /// Validate a request and turn it into an animal without bookkeeping fields
    async fn build_animal(&self, request: AnimalRequest, self_id: Option<&str>) -> ServiceResult<Animal> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Animal name cannot be empty"));
        }

        let species = match self.repos.species.get(&request.species_id).await? {
            Some(species) => species,
            None => {
                warn!("Animal {:?} references unknown species {}", name, request.species_id);
                return Err(ServiceError::validation(format!(
                    "Unknown species: {}",
                    request.species_id
                )));
            }
        };
        let custom_fields = validate_custom_fields(&species, &request.custom_fields)?;

        let sire = non_empty(request.sire);
        let dam = non_empty(request.dam);
        if let Some(self_id) = self_id {
            if sire.as_deref() == Some(self_id) || dam.as_deref() == Some(self_id) {
                return Err(ServiceError::validation("An animal cannot be its own parent"));
            }
        }

        let owner = match request.owner {
            Some(AnimalOwner::Custom(text)) if text.trim().is_empty() => None,
            Some(AnimalOwner::Farm(id)) if id.trim().is_empty() => None,
            other => other,
        };

        Ok(Animal {
            id: String::new(),
            name,
            species_id: request.species_id,
            gender: request.gender,
            color: non_empty(request.color),
            birth_date: request.birth_date,
            acquisition_date: request.acquisition_date,
            status: request.status,
            status_details: if request.status.has_details() {
                request.status_details
            } else {
                None
            },
            owner,
            sire,
            dam,
            photo: non_empty(request.photo),
            owner_id: String::new(),
            custom_fields,
            created_at: None,
            updated_at: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn matches_filter(animal: &Animal, filter: &AnimalFilter) -> bool {
    if let Some(species_id) = filter.species_id.as_deref().filter(|s| !s.is_empty()) {
        if animal.species_id != species_id {
            return false;
        }
    }
    if filter.status.is_some_and(|status| animal.status != status) {
        return false;
    }
    if filter.gender.is_some_and(|gender| animal.gender != gender) {
        return false;
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !animal.name.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

/// Newest first; animals without a creation time go last
fn sort_newest_first(animals: &mut [Animal]) {
    animals.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Owner display name: farm name, free text, or `Unknown`
pub fn owner_name(owner: Option<&AnimalOwner>, farms: &HashMap<String, String>) -> String {
    match owner {
        Some(AnimalOwner::Farm(id)) => farms
            .get(id)
            .cloned()
            .unwrap_or_else(|| "Unknown Farm".to_string()),
        Some(AnimalOwner::Custom(text)) => text.clone(),
        None => "Unknown".to_string(),
    }
}

/// Age in whole calendar months, shown as months under a year
pub fn describe_age(birth_date: NaiveDate, today: NaiveDate) -> String {
    let months = (today.year() - birth_date.year()) * 12 + today.month() as i32 - birth_date.month() as i32;
    let months = months.max(0);

    if months < 12 {
        format!("{} month{}", months, if months == 1 { "" } else { "s" })
    } else {
        let years = months / 12;
        format!("{} year{}", years, if years == 1 { "" } else { "s" })
    }
}

/// Check raw custom field input against the species and convert it to typed values
pub fn validate_custom_fields(
    species: &Species,
    values: &BTreeMap<String, String>,
) -> ServiceResult<BTreeMap<String, CustomFieldValue>> {
    let mut typed = BTreeMap::new();

    for (name, raw) in values {
        let Some(definition) = species.custom_fields.iter().find(|field| field.name == *name) else {
            return Err(ServiceError::validation(format!(
                "Unknown field '{}' for species {}",
                name, species.name
            )));
        };

        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let value = match definition.field_type {
            CustomFieldType::Text => CustomFieldValue::Text(raw.to_string()),
            CustomFieldType::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(CustomFieldValue::Number)
                .ok_or_else(|| ServiceError::validation(format!("Field '{}' must be a number", name)))?,
            CustomFieldType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(CustomFieldValue::Date)
                .map_err(|_| ServiceError::validation(format!("Field '{}' must be a date (YYYY-MM-DD)", name)))?,
            CustomFieldType::Boolean => match raw {
                "true" => CustomFieldValue::Boolean(true),
                "false" => CustomFieldValue::Boolean(false),
                _ => {
                    return Err(ServiceError::validation(format!(
                        "Field '{}' must be true or false",
                        name
                    )))
                }
            },
            CustomFieldType::Select => {
                if !definition.options.iter().any(|option| option == raw) {
                    return Err(ServiceError::validation(format!(
                        "'{}' is not an option for field '{}'",
                        raw, name
                    )));
                }
                CustomFieldValue::Select(raw.to_string())
            }
        };
        typed.insert(name.clone(), value);
    }

    Ok(typed)
}
