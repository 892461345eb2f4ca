//! # Prospect
//!
//! Business core for a multi-galaxy resource prospecting backend.
//!
//! Five domains (galaxies, resources, resource types, resource groups
//! and users) share one generic implementation of the whole
//! business/store contract: filtered, ordered and paged listing plus
//! all-or-nothing bulk mutation with fail-fast per-item validation.
//! Each domain contributes only data (table spec, sort-key allow-list,
//! filter fields, patch rules); the logic lives once in `core` and
//! `storage`.
//!
//! ## Features
//!
//! - **Generic entity core**: `Record`/`Entity` traits + one
//!   `EntityService<T, S>` per domain type
//! - **Validated querying**: sparse AND-combined filters, closed
//!   sort-key allow-lists, clamped 1-based pagination
//! - **All-or-nothing bulk**: batch validation collects every item
//!   error before storage; persistence is one transaction
//! - **Typed errors**: `NotFound` / `Aborted` / `FailedPrecondition` /
//!   `Internal`, classified at the service boundary
//! - **Swappable storage**: generic PostgreSQL store (sqlx) plus an
//!   in-memory store for tests and development
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use prospect::prelude::*;
//! use prospect::domain::galaxy::{Galaxy, GalaxyFilter, NewGalaxy};
//!
//! let store = InMemoryStore::<Galaxy>::new();
//! let galaxies = EntityService::new(store);
//!
//! let created = galaxies
//!     .create(NewGalaxy {
//!         name: Name::parse("Ahazi")?,
//!         owner_user_id: owner,
//!     })
//!     .await?;
//!
//! let page = galaxies
//!     .query_page(&GalaxyFilter::default(), OrderBy::default(), Page::default())
//!     .await?;
//! ```

pub mod core;
pub mod domain;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        bulk::{MAX_BATCH_SIZE, convert_batch, validate_batch_size},
        entity::{Entity, Record, TableSpec},
        error::{BulkItemError, Error},
        field::FieldValue,
        filter::{Predicate, QueryFilter},
        name::Name,
        order::{Direction, OrderBy, SortKey},
        page::{Page, PageDocument},
        service::EntityService,
    };

    // === Storage ===
    pub use crate::storage::{EntityStore, InMemoryStore, PostgresStore, StoreConfig, StoreError};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
