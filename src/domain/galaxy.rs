//! Galaxy domain
//!
//! A galaxy is a named shard of the game world that resources are
//! reported against. Galaxy names are unique across the system.

use crate::core::bulk;
use crate::core::entity::{Entity, Record, TableSpec};
use crate::core::error::{BulkItemError, Error};
use crate::core::field::FieldValue;
use crate::core::filter::{Predicate, QueryFilter};
use crate::core::name::Name;
use crate::domain::parse_uuid;
use crate::sort_keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static TABLE: TableSpec = TableSpec {
    table: "galaxies",
    entity: "galaxy",
    key_column: "galaxy_id",
    lookup_column: "galaxy_name",
    columns: &[
        "galaxy_id",
        "galaxy_name",
        "owner_user_id",
        "enabled",
        "date_created",
        "date_updated",
    ],
    update_columns: &["galaxy_name", "owner_user_id", "enabled", "date_updated"],
};

/// Information about an individual galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Galaxy {
    #[sqlx(rename = "galaxy_id")]
    pub id: Uuid,
    #[sqlx(rename = "galaxy_name")]
    #[sqlx(try_from = "String")]
    pub name: Name,
    pub owner_user_id: Uuid,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

/// Data needed to create a new galaxy.
#[derive(Debug, Clone)]
pub struct NewGalaxy {
    pub name: Name,
    pub owner_user_id: Uuid,
}

/// Sparse patch for an existing galaxy; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateGalaxy {
    pub name: Option<Name>,
    pub owner_user_id: Option<Uuid>,
    pub enabled: Option<bool>,
}

sort_keys! {
    /// Sort keys accepted by galaxy queries.
    pub enum GalaxySort {
        GalaxyId => "galaxy_id",
        Name => "galaxy_name",
        OwnerUserId => "owner_user_id",
        DateCreated => "date_created",
        Enabled => "enabled",
    }
}

/// The fields a galaxy query can be filtered on.
#[derive(Debug, Clone, Default)]
pub struct GalaxyFilter {
    pub id: Option<Uuid>,
    /// Case-sensitive substring match against the galaxy name.
    pub name: Option<String>,
    pub owner_user_id: Option<Uuid>,
    pub enabled: Option<bool>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

impl QueryFilter for GalaxyFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(id) = self.id {
            preds.push(Predicate::Eq {
                column: "galaxy_id",
                value: id.into(),
            });
        }
        if let Some(name) = &self.name {
            preds.push(Predicate::Contains {
                column: "galaxy_name",
                needle: name.clone(),
            });
        }
        if let Some(owner) = self.owner_user_id {
            preds.push(Predicate::Eq {
                column: "owner_user_id",
                value: owner.into(),
            });
        }
        if let Some(enabled) = self.enabled {
            preds.push(Predicate::Eq {
                column: "enabled",
                value: enabled.into(),
            });
        }
        if let Some(start) = self.start_created_date {
            preds.push(Predicate::AtLeast {
                column: "date_created",
                value: start.into(),
            });
        }
        if let Some(end) = self.end_created_date {
            preds.push(Predicate::AtMost {
                column: "date_created",
                value: end.into(),
            });
        }
        preds
    }
}

impl Record for Galaxy {
    type Key = Uuid;
    type Sort = GalaxySort;
    type Filter = GalaxyFilter;

    fn table() -> &'static TableSpec {
        &TABLE
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "galaxy_id" => Some(self.id.into()),
            "galaxy_name" => Some(self.name.as_str().into()),
            "owner_user_id" => Some(self.owner_user_id.into()),
            "enabled" => Some(self.enabled.into()),
            "date_created" => Some(self.date_created.into()),
            "date_updated" => Some(self.date_updated.into()),
            _ => None,
        }
    }
}

impl Entity for Galaxy {
    type New = NewGalaxy;
    type Update = UpdateGalaxy;

    fn create(new: NewGalaxy, now: DateTime<Utc>) -> Self {
        Galaxy {
            id: Uuid::new_v4(),
            name: new.name,
            owner_user_id: new.owner_user_id,
            enabled: true,
            date_created: now,
            date_updated: now,
        }
    }

    fn apply(&mut self, update: UpdateGalaxy) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(owner) = update.owner_user_id {
            self.owner_user_id = owner;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.date_updated = now;
    }
}

// ---------------------------------------------------------------------------
// Externally-supplied request payloads
// ---------------------------------------------------------------------------

/// Wire payload for creating a galaxy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewGalaxyRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "ownerUserId is required"))]
    pub owner_user_id: String,
}

impl NewGalaxyRequest {
    pub fn to_domain(&self) -> Result<NewGalaxy, Error> {
        self.validate()?;
        Ok(NewGalaxy {
            name: Name::parse(&self.name)?,
            owner_user_id: parse_uuid("ownerUserId", &self.owner_user_id)?,
        })
    }
}

/// Wire payload for patching a galaxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalaxyRequest {
    pub name: Option<String>,
    pub owner_user_id: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateGalaxyRequest {
    pub fn to_domain(&self) -> Result<UpdateGalaxy, Error> {
        Ok(UpdateGalaxy {
            name: self.name.as_deref().map(Name::parse).transpose()?,
            owner_user_id: self
                .owner_user_id
                .as_deref()
                .map(|raw| parse_uuid("ownerUserId", raw))
                .transpose()?,
            enabled: self.enabled,
        })
    }
}

/// One item of a bulk galaxy update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGalaxyWithId {
    pub id: String,
    pub data: UpdateGalaxyRequest,
}

/// Convert a batch of create payloads, collecting every item failure.
pub fn convert_new_batch(items: Vec<NewGalaxyRequest>) -> Result<Vec<NewGalaxy>, Error> {
    bulk::convert_batch(items, |index, item| {
        item.to_domain()
            .map_err(|err| BulkItemError::new(index, "item", err))
    })
}

/// Convert a batch of update payloads, collecting every item failure.
pub fn convert_update_batch(
    items: Vec<UpdateGalaxyWithId>,
) -> Result<Vec<(Uuid, UpdateGalaxy)>, Error> {
    bulk::convert_batch(items, |index, item| {
        let id = parse_uuid("id", &item.id).map_err(|err| BulkItemError::new(index, "id", err))?;
        let data = item
            .data
            .to_domain()
            .map_err(|err| BulkItemError::new(index, "data", err))?;
        Ok((id, data))
    })
}

/// Convert a batch of identifiers for bulk delete.
pub fn convert_delete_batch(ids: Vec<String>) -> Result<Vec<Uuid>, Error> {
    bulk::convert_batch(ids, |index, id| {
        parse_uuid("id", &id).map_err(|err| BulkItemError::new(index, "id", err))
    })
}
