//! In-memory implementation of EntityStore for testing and development
//!
//! Implements the full store contract (filtering, ordering, paging,
//! uniqueness on the natural lookup column, and all-or-nothing bulk
//! mutation) against a `Vec` behind an `RwLock`. Bulk operations stage
//! their changes on a copy and swap it in only when every item succeeds,
//! which mirrors the transactional guarantee of the SQL store.
//!
//! Set-membership predicates normally resolve through another table;
//! here the groups are registered up front with [`InMemoryStore::set_membership`].

use crate::core::entity::Record;
use crate::core::field::FieldValue;
use crate::core::filter::{Predicate, QueryFilter};
use crate::core::order::{Direction, OrderBy};
use crate::core::page::Page;
use crate::storage::{EntityStore, StoreError};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// In-memory entity store.
///
/// Cloning shares the underlying data, like cloning a connection pool.
#[derive(Clone)]
pub struct InMemoryStore<T> {
    rows: Arc<RwLock<Vec<T>>>,
    memberships: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            memberships: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register the members of a group for `MemberOf` predicate
    /// evaluation (the SQL store resolves these through a subquery).
    pub fn set_membership(&self, group: &str, members: &[&str]) {
        self.memberships
            .write()
            .expect("membership lock poisoned")
            .insert(
                group.to_string(),
                members.iter().map(|m| m.to_string()).collect(),
            );
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryStore<T> {
    fn matches(
        entity: &T,
        predicate: &Predicate,
        memberships: &HashMap<String, HashSet<String>>,
    ) -> bool {
        match predicate {
            Predicate::Eq { column, value } => entity
                .field(column)
                .is_some_and(|field| field.matches(value)),
            Predicate::Contains { column, needle } => entity
                .field(column)
                .and_then(|field| field.as_text().map(|text| text.contains(needle.as_str())))
                .unwrap_or(false),
            Predicate::AtLeast { column, value } => entity
                .field(column)
                .and_then(|field| field.compare(value))
                .is_some_and(|ordering| ordering != Ordering::Less),
            Predicate::AtMost { column, value } => entity
                .field(column)
                .and_then(|field| field.compare(value))
                .is_some_and(|ordering| ordering != Ordering::Greater),
            Predicate::MemberOf { column, value, .. } => {
                let Some(members) = memberships.get(value) else {
                    return false;
                };
                entity
                    .field(column)
                    .and_then(|field| field.as_text().map(|text| members.contains(text)))
                    .unwrap_or(false)
            }
        }
    }

    fn matches_all(
        entity: &T,
        predicates: &[Predicate],
        memberships: &HashMap<String, HashSet<String>>,
    ) -> bool {
        predicates
            .iter()
            .all(|p| Self::matches(entity, p, memberships))
    }

    /// Uniqueness check on the lookup column against `rows`, ignoring the
    /// row with the same key (a row never conflicts with itself).
    fn violates_uniqueness(rows: &[T], candidate: &T) -> bool {
        let Some(lookup) = candidate.lookup_value() else {
            return false;
        };
        let key = candidate.key().to_string();
        rows.iter().any(|row| {
            row.key().to_string() != key
                && row
                    .lookup_value()
                    .is_some_and(|existing| existing.matches(&lookup))
        })
    }

    fn position_of(rows: &[T], key: &T::Key) -> Option<usize> {
        let key = key.to_string();
        rows.iter().position(|row| row.key().to_string() == key)
    }

    fn read_rows(&self) -> Vec<T> {
        self.rows.read().expect("row lock poisoned").clone()
    }
}

#[async_trait]
impl<T: Record> EntityStore<T> for InMemoryStore<T> {
    async fn create(&self, entity: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");
        if Self::position_of(&rows, &entity.key()).is_some()
            || Self::violates_uniqueness(&rows, entity)
        {
            return Err(StoreError::DuplicateEntry);
        }
        rows.push(entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");
        if Self::violates_uniqueness(&rows, entity) {
            return Err(StoreError::DuplicateEntry);
        }
        // Zero matched rows is success, mirroring the SQL store.
        if let Some(position) = Self::position_of(&rows, &entity.key()) {
            rows[position] = entity.clone();
        }
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");
        let key = entity.key().to_string();
        rows.retain(|row| row.key().to_string() != key);
        Ok(())
    }

    async fn query(
        &self,
        filter: &T::Filter,
        order: OrderBy<T::Sort>,
        page: Page,
    ) -> Result<Vec<T>, StoreError> {
        let memberships = self.memberships.read().expect("membership lock poisoned");
        let predicates = filter.predicates();

        let mut matched: Vec<T> = self
            .read_rows()
            .into_iter()
            .filter(|row| Self::matches_all(row, &predicates, &memberships))
            .collect();

        let column = order.column();
        matched.sort_by(|a, b| {
            let ordering = match (a.field(column), b.field(column)) {
                (Some(left), Some(right)) => left.compare(&right).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match order.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });

        Ok(matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.rows_per_page() as usize)
            .collect())
    }

    async fn count(&self, filter: &T::Filter) -> Result<i64, StoreError> {
        let memberships = self.memberships.read().expect("membership lock poisoned");
        let predicates = filter.predicates();
        let count = self
            .read_rows()
            .iter()
            .filter(|row| Self::matches_all(row, &predicates, &memberships))
            .count();
        Ok(count as i64)
    }

    async fn query_by_key(&self, key: &T::Key) -> Result<T, StoreError> {
        let rows = self.rows.read().expect("row lock poisoned");
        Self::position_of(&rows, key)
            .map(|position| rows[position].clone())
            .ok_or(StoreError::NotFound)
    }

    async fn query_by_name(&self, name: &str) -> Result<T, StoreError> {
        let rows = self.rows.read().expect("row lock poisoned");
        rows.iter()
            .find(|row| {
                row.lookup_value()
                    .and_then(|value| value.as_text().map(|text| text == name))
                    .unwrap_or(false)
            })
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn bulk_create(&self, entities: &[T]) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");

        // Stage on a copy so a failing item leaves nothing behind.
        let mut staged = rows.clone();
        for (index, entity) in entities.iter().enumerate() {
            if Self::position_of(&staged, &entity.key()).is_some()
                || Self::violates_uniqueness(&staged, entity)
            {
                return Err(StoreError::item(index, StoreError::DuplicateEntry));
            }
            staged.push(entity.clone());
        }

        *rows = staged;
        Ok(())
    }

    async fn bulk_update(&self, entities: &[T]) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");

        let mut staged = rows.clone();
        for (index, entity) in entities.iter().enumerate() {
            if Self::violates_uniqueness(&staged, entity) {
                return Err(StoreError::item(index, StoreError::DuplicateEntry));
            }
            if let Some(position) = Self::position_of(&staged, &entity.key()) {
                staged[position] = entity.clone();
            }
        }

        *rows = staged;
        Ok(())
    }

    async fn bulk_delete(&self, keys: &[T::Key]) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("row lock poisoned");
        let keys: HashSet<String> = keys.iter().map(|key| key.to_string()).collect();
        rows.retain(|row| !keys.contains(&row.key().to_string()));
        Ok(())
    }
}
