//! Generic business service
//!
//! One [`EntityService`] instantiation per domain type replaces the five
//! near-identical per-domain business layers the system grew out of. The
//! service owns the lifecycle rules (identity and timestamp assignment on
//! create, sparse patch application on update, fail-fast read phases for
//! bulk updates) and translates storage failures into the domain error
//! taxonomy. It holds no state beyond its store reference, so one value
//! can be shared across any number of concurrent requests.

use crate::core::entity::Entity;
use crate::core::error::Error;
use crate::core::order::OrderBy;
use crate::core::page::{Page, PageDocument};
use crate::storage::{EntityStore, StoreError};
use chrono::Utc;
use std::marker::PhantomData;
use tracing::debug;

/// Business orchestration for one entity type over a swappable store.
#[derive(Debug, Clone)]
pub struct EntityService<T, S> {
    store: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> EntityService<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    /// Construct a service for use.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Map a store failure into the domain taxonomy, with the failing
    /// operation as context.
    fn classify(operation: &str, err: StoreError) -> Error {
        let entity = T::table().entity;
        match err {
            StoreError::DuplicateEntry => {
                Error::aborted(entity, format!("{operation}: {entity} is not unique"))
            }
            StoreError::NotFound => Error::not_found(entity, operation),
            StoreError::Item { index, source } if source.is_duplicate() => Error::aborted(
                entity,
                format!("{operation}: item[{index}]: {entity} is not unique"),
            ),
            other => Error::internal(format!("{operation}: {entity}"), other),
        }
    }

    /// Add a new entity to the system, assigning a fresh identifier and
    /// setting both audit timestamps to now.
    pub async fn create(&self, new: T::New) -> Result<T, Error> {
        let entity = T::create(new, Utc::now());
        debug!(entity = T::table().entity, key = %entity.key(), "create");

        self.store
            .create(&entity)
            .await
            .map_err(|err| Self::classify("create", err))?;

        Ok(entity)
    }

    /// Apply a sparse patch to an already-fetched entity and persist the
    /// result. The updated timestamp is refreshed unconditionally, even
    /// for an all-`None` patch.
    pub async fn update(&self, mut entity: T, update: T::Update) -> Result<T, Error> {
        entity.apply(update);
        entity.touch(Utc::now());
        debug!(entity = T::table().entity, key = %entity.key(), "update");

        self.store
            .update(&entity)
            .await
            .map_err(|err| Self::classify("update", err))?;

        Ok(entity)
    }

    /// Remove the specified entity. No soft-delete semantics.
    pub async fn delete(&self, entity: &T) -> Result<(), Error> {
        debug!(entity = T::table().entity, key = %entity.key(), "delete");

        self.store
            .delete(entity)
            .await
            .map_err(|err| Self::classify("delete", err))
    }

    /// Retrieve a filtered, ordered page of entities.
    pub async fn query(
        &self,
        filter: &T::Filter,
        order: OrderBy<T::Sort>,
        page: Page,
    ) -> Result<Vec<T>, Error> {
        self.store
            .query(filter, order, page)
            .await
            .map_err(|err| Self::classify("query", err))
    }

    /// Total number of entities matching the filter, independent of
    /// paging.
    pub async fn count(&self, filter: &T::Filter) -> Result<i64, Error> {
        self.store
            .count(filter)
            .await
            .map_err(|err| Self::classify("count", err))
    }

    /// Retrieve one page of entities together with pagination metadata.
    pub async fn query_page(
        &self,
        filter: &T::Filter,
        order: OrderBy<T::Sort>,
        page: Page,
    ) -> Result<PageDocument<T>, Error> {
        let items = self.query(filter, order, page).await?;
        let total = self.count(filter).await?;
        Ok(PageDocument::new(items, total, page))
    }

    /// Find the entity with the given primary key.
    pub async fn query_by_key(&self, key: &T::Key) -> Result<T, Error> {
        self.store.query_by_key(key).await.map_err(|err| match err {
            StoreError::NotFound => Error::not_found(T::table().entity, key),
            other => Self::classify("query_by_key", other),
        })
    }

    /// Find the entity with the given natural name.
    pub async fn query_by_name(&self, name: &str) -> Result<T, Error> {
        self.store
            .query_by_name(name)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => Error::not_found(T::table().entity, name),
                other => Self::classify("query_by_name", other),
            })
    }

    /// Add multiple entities in a single all-or-nothing transaction.
    ///
    /// Identity and timestamps are assigned eagerly for every item, with
    /// one shared "now" across the whole batch.
    pub async fn bulk_create(&self, news: Vec<T::New>) -> Result<Vec<T>, Error> {
        let now = Utc::now();
        let entities: Vec<T> = news.into_iter().map(|new| T::create(new, now)).collect();
        debug!(
            entity = T::table().entity,
            count = entities.len(),
            "bulk create"
        );

        self.store
            .bulk_create(&entities)
            .await
            .map_err(|err| Self::classify("bulk_create", err))?;

        Ok(entities)
    }

    /// Apply patches to multiple entities in a single all-or-nothing
    /// transaction.
    ///
    /// Every target is re-fetched by key first; if any key does not
    /// resolve, the whole operation fails before any write is attempted.
    pub async fn bulk_update(&self, updates: Vec<(T::Key, T::Update)>) -> Result<Vec<T>, Error> {
        let now = Utc::now();
        let mut entities = Vec::with_capacity(updates.len());

        for (index, (key, update)) in updates.into_iter().enumerate() {
            let mut entity = self.store.query_by_key(&key).await.map_err(|err| {
                if err.is_not_found() {
                    Error::not_found(T::table().entity, format!("item[{index}]: {key}"))
                } else {
                    Self::classify("bulk_update", err)
                }
            })?;
            entity.apply(update);
            entity.touch(now);
            entities.push(entity);
        }

        debug!(
            entity = T::table().entity,
            count = entities.len(),
            "bulk update"
        );

        self.store
            .bulk_update(&entities)
            .await
            .map_err(|err| Self::classify("bulk_update", err))?;

        Ok(entities)
    }

    /// Remove multiple entities in a single all-or-nothing transaction.
    pub async fn bulk_delete(&self, keys: Vec<T::Key>) -> Result<(), Error> {
        debug!(entity = T::table().entity, count = keys.len(), "bulk delete");

        self.store
            .bulk_delete(&keys)
            .await
            .map_err(|err| Self::classify("bulk_delete", err))
    }
}
