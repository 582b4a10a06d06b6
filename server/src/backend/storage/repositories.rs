//! Typed repositories over the document store.
//!
//! Each entity type knows its collection; the repository converts between
//! the JSON document and the entity and copies the document key into the
//! entity's `id` on load.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use super::traits::{Batch, DocumentStore, SetMode};
use shared::{Account, Animal, Farm, HealthRecord, HealthTask, Paycheck, Species};

pub const ACCOUNTS: &str = "accounts";
pub const INCOME: &str = "income";
pub const FARMS: &str = "farms";
pub const SPECIES: &str = "species";
pub const ANIMALS: &str = "animals";
pub const HEALTH_RECORDS: &str = "healthRecords";
pub const HEALTH_TASKS: &str = "healthTasks";

/// An entity persisted as one document in a fixed collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn set_id(&mut self, id: &str);
}

macro_rules! keyed_entity {
    ($ty:ty, $collection:expr) => {
        impl Entity for $ty {
            const COLLECTION: &'static str = $collection;

            fn set_id(&mut self, id: &str) {
                self.id = id.to_string();
            }
        }
    };
}

keyed_entity!(Account, ACCOUNTS);
keyed_entity!(Farm, FARMS);
keyed_entity!(Species, SPECIES);
keyed_entity!(Animal, ANIMALS);
keyed_entity!(HealthRecord, HEALTH_RECORDS);
keyed_entity!(HealthTask, HEALTH_TASKS);

impl Entity for Paycheck {
    const COLLECTION: &'static str = INCOME;

    fn set_id(&mut self, _id: &str) {}
}

/// Repository for one entity type
pub struct Repository<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Allocate an id for a document written later through a batch
    pub fn new_id(&self) -> String {
        self.store.new_id()
    }

    /// All entities of the collection; undecodable documents are skipped
    pub async fn list(&self) -> Result<Vec<T>> {
        let documents = self.store.list(T::COLLECTION).await?;
        let mut entities = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<T>(document.body) {
                Ok(mut entity) => {
                    entity.set_id(&document.id);
                    entities.push(entity);
                }
                Err(e) => warn!("Skipping undecodable {}/{}: {}", T::COLLECTION, document.id, e),
            }
        }
        Ok(entities)
    }

    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(body) => {
                let mut entity: T = serde_json::from_value(body)
                    .with_context(|| format!("failed to decode {}/{}", T::COLLECTION, id))?;
                entity.set_id(id);
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Store a new entity and return its generated id
    pub async fn create(&self, entity: &T) -> Result<String> {
        self.store.create(T::COLLECTION, to_document(entity)?).await
    }

    pub async fn replace(&self, id: &str, entity: &T) -> Result<()> {
        self.store
            .set(T::COLLECTION, id, to_document(entity)?, SetMode::Replace)
            .await
    }

    /// Shallow merge of the given fields into the stored document
    pub async fn merge(&self, id: &str, fields: Value) -> Result<()> {
        self.store.set(T::COLLECTION, id, fields, SetMode::Merge).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    /// Queue a replace of `entity` under `id` in `batch`
    pub fn stage_replace(&self, batch: &mut Batch, id: &str, entity: &T) -> Result<()> {
        batch.set(T::COLLECTION, id, to_document(entity)?, SetMode::Replace);
        Ok(())
    }

    /// Queue a check that the stored field at `pointer` still equals `value`
    pub fn stage_expect<V: Serialize>(&self, batch: &mut Batch, id: &str, pointer: &str, value: &V) -> Result<()> {
        batch.expect(T::COLLECTION, id, pointer, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn stage_delete(&self, batch: &mut Batch, id: &str) {
        batch.delete(T::COLLECTION, id);
    }
}

/// Serialize an entity without its `id` field; the id lives in the key
fn to_document<T: Serialize>(entity: &T) -> Result<Value> {
    let mut body = serde_json::to_value(entity)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

/// One handle per collection, sharing a single store
#[derive(Clone)]
pub struct Repositories {
    pub store: Arc<dyn DocumentStore>,
    pub accounts: Repository<Account>,
    pub income: Repository<Paycheck>,
    pub farms: Repository<Farm>,
    pub species: Repository<Species>,
    pub animals: Repository<Animal>,
    pub health_records: Repository<HealthRecord>,
    pub health_tasks: Repository<HealthTask>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            accounts: Repository::new(store.clone()),
            income: Repository::new(store.clone()),
            farms: Repository::new(store.clone()),
            species: Repository::new(store.clone()),
            animals: Repository::new(store.clone()),
            health_records: Repository::new(store.clone()),
            health_tasks: Repository::new(store.clone()),
            store,
        }
    }

    /// Apply a grouped write
    pub async fn commit(&self, batch: Batch) -> Result<()> {
        self.store.commit(batch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::SqliteDocumentStore;
    use serde_json::json;
    use shared::AccountType;

    async fn create_test_repositories() -> Repositories {
        let store = SqliteDocumentStore::init_test().await.unwrap();
        Repositories::new(Arc::new(store))
    }

    fn visa() -> Account {
        Account {
            id: String::new(),
            name: "Visa".to_string(),
            account_type: AccountType::CreditCard,
            balance: 1200.0,
            credit_limit: Some(5000.0),
            apr: None,
            min_payment: 35.0,
            promotions: vec![],
        }
    }

    #[tokio::test]
    async fn test_loaded_entity_carries_document_key() {
        let repos = create_test_repositories().await;
        let id = repos.accounts.create(&visa()).await.unwrap();

        let loaded = repos.accounts.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Visa");

        let stored = repos.store.get(ACCOUNTS, &id).await.unwrap().unwrap();
        assert!(stored.get("id").is_none());
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_documents() {
        let repos = create_test_repositories().await;
        repos.accounts.create(&visa()).await.unwrap();
        repos.store.create(ACCOUNTS, json!({"name": 42})).await.unwrap();

        let accounts = repos.accounts.list().await.unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_staged_writes_land_together() {
        let repos = create_test_repositories().await;
        let mut batch = Batch::new();
        let id = repos.accounts.new_id();
        repos.accounts.stage_replace(&mut batch, &id, &visa()).unwrap();
        repos.commit(batch).await.unwrap();

        assert!(repos.accounts.get(&id).await.unwrap().is_some());
    }
}
