//! Storage adapters
//!
//! [`EntityStore`] is the persistence contract the business service runs
//! on: one generic implementation per backend, instantiated for every
//! domain type. Two backends ship here: PostgreSQL for production and an
//! in-memory store for tests and development.
//!
//! Store errors are classified close to the driver ([`StoreError`]) and
//! re-classified into domain error kinds at the service boundary; raw
//! driver errors never cross into the business layer.

pub mod config;
pub mod memory;
pub mod postgres;

pub use config::StoreConfig;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::core::entity::Record;
use crate::core::order::OrderBy;
use crate::core::page::Page;
use async_trait::async_trait;

/// Storage-level failure, classified from the backend's error signals.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected a uniqueness constraint (duplicate key signal).
    #[error("duplicate entry")]
    DuplicateEntry,

    /// A single-row lookup matched zero rows.
    #[error("record not found")]
    NotFound,

    /// A column listed in the table spec is not mapped by the record.
    #[error("column {0:?} is not mapped by the record")]
    UnmappedColumn(&'static str),

    /// Failure attributable to one item of a bulk batch.
    #[error("item[{index}]: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<StoreError>,
    },

    /// Any other driver failure.
    #[error("database: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Wrap a failure with the index of the bulk item that caused it.
    pub fn item(index: usize, source: StoreError) -> Self {
        StoreError::Item {
            index,
            source: Box::new(source),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        match self {
            StoreError::DuplicateEntry => true,
            StoreError::Item { source, .. } => source.is_duplicate(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound => true,
            StoreError::Item { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateEntry
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistence contract for one entity type.
///
/// Bulk mutations are all-or-nothing: every item's statement executes
/// inside one transaction, items are applied in input order, and any
/// single failure rolls back the entire batch. Partial writes are never
/// observable.
#[async_trait]
pub trait EntityStore<T: Record>: Send + Sync {
    /// Insert one row. Fails with [`StoreError::DuplicateEntry`] when a
    /// uniqueness invariant is violated.
    async fn create(&self, entity: &T) -> Result<(), StoreError>;

    /// Full-row replace keyed by the primary key. Zero affected rows is
    /// treated as success, matching `delete`.
    async fn update(&self, entity: &T) -> Result<(), StoreError>;

    /// Remove one row. Zero affected rows is success: delete is
    /// idempotent by contract.
    async fn delete(&self, entity: &T) -> Result<(), StoreError>;

    /// Filtered, ordered, paged listing.
    async fn query(
        &self,
        filter: &T::Filter,
        order: OrderBy<T::Sort>,
        page: Page,
    ) -> Result<Vec<T>, StoreError>;

    /// Row count for the same filter semantics as `query`.
    async fn count(&self, filter: &T::Filter) -> Result<i64, StoreError>;

    /// Single-row lookup by primary key; [`StoreError::NotFound`] on zero
    /// rows.
    async fn query_by_key(&self, key: &T::Key) -> Result<T, StoreError>;

    /// Single-row lookup by the natural lookup column; `NotFound` on zero
    /// rows.
    async fn query_by_name(&self, name: &str) -> Result<T, StoreError>;

    /// Insert every row in one transaction.
    async fn bulk_create(&self, entities: &[T]) -> Result<(), StoreError>;

    /// Replace every row in one transaction.
    async fn bulk_update(&self, entities: &[T]) -> Result<(), StoreError>;

    /// Delete every key in one statement (IN-list of identifiers).
    async fn bulk_delete(&self, keys: &[T::Key]) -> Result<(), StoreError>;
}
