//! # Storage Traits
//!
//! The document store abstraction the domain layer is written against.
//! Documents are JSON objects grouped into named collections and addressed
//! by string ids. Any backend that can list, read, write and delete such
//! documents, and apply a group of writes atomically, can stand in for the
//! SQLite implementation.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// How `set` treats an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Overwrite the whole document
    Replace,
    /// Shallow merge: top-level keys of the new body win, other keys are kept
    Merge,
}

/// A stored document together with its key
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Value,
}

/// One write inside a grouped write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        body: Value,
        mode: SetMode,
    },
    Delete {
        collection: String,
        id: String,
    },
    /// Abort the batch unless the stored document holds `value` at `pointer`
    Expect {
        collection: String,
        id: String,
        pointer: String,
        value: Value,
    },
}

/// A batch precondition did not hold when the batch was applied
#[derive(Debug, Clone, PartialEq, Error)]
#[error("precondition failed on {collection}/{id}: expected {pointer} = {expected}")]
pub struct PreconditionFailed {
    pub collection: String,
    pub id: String,
    pub pointer: String,
    pub expected: Value,
}

impl PreconditionFailed {
    /// Whether a storage error was caused by a failed precondition
    pub fn is_cause_of(error: &anyhow::Error) -> bool {
        error.downcast_ref::<PreconditionFailed>().is_some()
    }
}

/// Ordered group of writes applied all-or-nothing by [`DocumentStore::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    ops: Vec<WriteOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: &str, id: &str, body: Value, mode: SetMode) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            body,
            mode,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Check a field of a stored document before any later write applies.
    /// `pointer` is a JSON pointer such as `/status`.
    pub fn expect(&mut self, collection: &str, id: &str, pointer: &str, value: Value) -> &mut Self {
        self.ops.push(WriteOp::Expect {
            collection: collection.to_string(),
            id: id.to_string(),
            pointer: pointer.to_string(),
            value,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Trait defining the interface for document storage operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, in insertion order
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// A single document, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Store a new document under a freshly generated id and return the id
    async fn create(&self, collection: &str, body: Value) -> Result<String>;

    /// Write a document under a known id, creating it if needed
    async fn set(&self, collection: &str, id: &str, body: Value, mode: SetMode) -> Result<()>;

    /// Delete a document
    /// Returns true if the document existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Apply every write of the batch atomically
    async fn commit(&self, batch: Batch) -> Result<()>;

    /// Allocate an id for a document that will be written later in a batch
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Shallow merge of `update` into `existing`.
/// Non-object values are replaced wholesale.
pub fn merge_documents(existing: Value, update: Value) -> Value {
    match (existing, update) {
        (Value::Object(mut base), Value::Object(changes)) => {
            for (key, value) in changes {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, update) => update,
    }
}

/// Empty JSON object, used when a merge targets a missing document
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_untouched_keys() {
        let existing = json!({"farm_name": "Old", "location": "Hill", "owner_id": "u1"});
        let merged = merge_documents(existing, json!({"farm_name": "New"}));
        assert_eq!(merged, json!({"farm_name": "New", "location": "Hill", "owner_id": "u1"}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let existing = json!({"withdrawal": {"meat": 3, "dairy": 2}});
        let merged = merge_documents(existing, json!({"withdrawal": {"eggs": 1}}));
        assert_eq!(merged, json!({"withdrawal": {"eggs": 1}}));
    }

    #[test]
    fn test_batch_keeps_write_order() {
        let mut batch = Batch::new();
        batch
            .expect("healthTasks", "t", "/status", json!("pending"))
            .set("accounts", "a", json!({}), SetMode::Replace)
            .delete("accounts", "b");
        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.ops()[0], WriteOp::Expect { ref pointer, .. } if pointer == "/status"));
        assert!(matches!(batch.ops()[2], WriteOp::Delete { ref id, .. } if id == "b"));
    }

    #[test]
    fn test_precondition_failure_is_recognised() {
        let failure = PreconditionFailed {
            collection: "healthTasks".to_string(),
            id: "t".to_string(),
            pointer: "/status".to_string(),
            expected: json!("pending"),
        };
        assert!(PreconditionFailed::is_cause_of(&anyhow::Error::new(failure)));
        assert!(!PreconditionFailed::is_cause_of(&anyhow::anyhow!("disk full")));
    }
}
