//! Entity traits defining the core abstraction for all data types
//!
//! The whole crate runs on two traits:
//!
//! - [`Record`] is the storage-facing contract: a static [`TableSpec`]
//!   describing the physical table, a typed key, the sort-key and filter
//!   types, and per-column value access. Everything a store needs to
//!   persist and query a type is *data* supplied here; the store logic
//!   itself is written once.
//! - [`Entity`] adds the lifecycle contract on top: how to construct a
//!   record from a `New` payload (the server assigns identity and both
//!   timestamps at that moment) and how to apply a sparse `Update` patch.
//!
//! One generic service and one generic store per backend are instantiated
//! for each concrete domain type; only the data varies.

use crate::core::field::FieldValue;
use crate::core::filter::QueryFilter;
use crate::core::order::SortKey;
use chrono::{DateTime, Utc};
use std::fmt;

/// Static description of an entity's physical table.
///
/// Column names listed here are the only identifiers that ever reach a
/// SQL statement; user input never does.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Physical table name.
    pub table: &'static str,

    /// Singular entity name used in error and log context.
    pub entity: &'static str,

    /// Primary key column.
    pub key_column: &'static str,

    /// Natural lookup column (name, email, ...). Also the column whose
    /// uniqueness the in-memory store enforces.
    pub lookup_column: &'static str,

    /// Every persisted column, in SELECT/INSERT order.
    pub columns: &'static [&'static str],

    /// The mutable subset written by UPDATE statements.
    pub update_columns: &'static [&'static str],
}

/// The storage-facing contract of a persisted record.
pub trait Record: Clone + Send + Sync + Unpin + 'static {
    /// Primary key type: a UUID or a natural string key.
    type Key: Clone + Send + Sync + fmt::Display + Into<FieldValue> + 'static;

    /// The closed sort-key allow-list for this entity.
    type Sort: SortKey;

    /// The sparse filter type for this entity.
    type Filter: QueryFilter;

    /// The entity's table description.
    fn table() -> &'static TableSpec;

    /// This record's primary key.
    fn key(&self) -> Self::Key;

    /// The value stored in `column`, or `None` for columns this record
    /// does not map. Stores treat an unmapped column listed in the
    /// [`TableSpec`] as a programming error.
    fn field(&self, column: &str) -> Option<FieldValue>;

    /// The value in the natural lookup column.
    fn lookup_value(&self) -> Option<FieldValue> {
        self.field(Self::table().lookup_column)
    }
}

/// The lifecycle contract layered on top of [`Record`].
pub trait Entity: Record {
    /// The subset of fields required to construct a record. Identity and
    /// timestamps are never part of it; the server assigns those.
    type New: Send + Sync + 'static;

    /// A sparse patch: every field optional, `None` meaning "leave
    /// unchanged". Applying an all-`None` patch is a no-op that still
    /// refreshes the updated timestamp.
    type Update: Send + Sync + 'static;

    /// Construct a record from a `New` payload, assigning identity and
    /// setting both audit timestamps to `now`.
    fn create(new: Self::New, now: DateTime<Utc>) -> Self;

    /// Apply the present fields of a patch onto this record.
    fn apply(&mut self, update: Self::Update);

    /// Refresh the updated timestamp.
    fn touch(&mut self, now: DateTime<Utc>);
}
