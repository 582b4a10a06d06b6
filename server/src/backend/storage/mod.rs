//! # Storage Module
//!
//! Handles all data persistence for the homestead backend.
//!
//! The domain layer only sees the [`DocumentStore`] trait and the typed
//! [`Repository`] wrappers built on it, so the SQLite implementation can be
//! swapped for any other document database without touching services.
//!
//! ## Layout
//!
//! - **traits**: `DocumentStore`, grouped writes (`Batch`), merge semantics
//! - **sqlite**: the SQLx/SQLite implementation, one JSON document per row
//! - **repositories**: per-collection typed access for the shared entities

pub mod repositories;
pub mod sqlite;
pub mod traits;

pub use repositories::{Entity, Repositories, Repository};
pub use sqlite::SqliteDocumentStore;
pub use traits::{Batch, DocumentStore, PreconditionFailed, SetMode, StoredDocument, WriteOp};
