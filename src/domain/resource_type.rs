//! Resource type domain
//!
//! A resource type is a catalog definition keyed by a natural string
//! (e.g. "copper_polysteel"): which category and group it belongs to,
//! whether it can currently spawn, and the min/max range each stat can
//! roll within. Unlike galaxies and resources its key is caller-supplied,
//! not server-assigned.

use crate::core::bulk;
use crate::core::entity::{Entity, Record, TableSpec};
use crate::core::error::{BulkItemError, Error};
use crate::core::field::FieldValue;
use crate::core::filter::{Predicate, QueryFilter};
use crate::sort_keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

static TABLE: TableSpec = TableSpec {
    table: "resource_types",
    entity: "resource type",
    key_column: "resource_type",
    lookup_column: "resource_type_name",
    columns: &[
        "resource_type",
        "resource_type_name",
        "resource_category",
        "resource_group",
        "enterable",
        "max_types",
        "cr_min",
        "cr_max",
        "cd_min",
        "cd_max",
        "dr_min",
        "dr_max",
        "fl_min",
        "fl_max",
        "hr_min",
        "hr_max",
        "ma_min",
        "ma_max",
        "pe_min",
        "pe_max",
        "oq_min",
        "oq_max",
        "sr_min",
        "sr_max",
        "ut_min",
        "ut_max",
        "er_min",
        "er_max",
        "container_type",
        "inventory_type",
        "specific_planet",
    ],
    update_columns: &[
        "resource_type_name",
        "resource_category",
        "resource_group",
        "enterable",
        "max_types",
        "cr_min",
        "cr_max",
        "cd_min",
        "cd_max",
        "dr_min",
        "dr_max",
        "fl_min",
        "fl_max",
        "hr_min",
        "hr_max",
        "ma_min",
        "ma_max",
        "pe_min",
        "pe_max",
        "oq_min",
        "oq_max",
        "sr_min",
        "sr_max",
        "ut_min",
        "ut_max",
        "er_min",
        "er_max",
        "container_type",
        "inventory_type",
        "specific_planet",
    ],
};

/// The min/max roll range for each of the eleven stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatRanges {
    pub cr_min: i16,
    pub cr_max: i16,
    pub cd_min: i16,
    pub cd_max: i16,
    pub dr_min: i16,
    pub dr_max: i16,
    pub fl_min: i16,
    pub fl_max: i16,
    pub hr_min: i16,
    pub hr_max: i16,
    pub ma_min: i16,
    pub ma_max: i16,
    pub pe_min: i16,
    pub pe_max: i16,
    pub oq_min: i16,
    pub oq_max: i16,
    pub sr_min: i16,
    pub sr_max: i16,
    pub ut_min: i16,
    pub ut_max: i16,
    pub er_min: i16,
    pub er_max: i16,
}

impl StatRanges {
    fn field(&self, column: &str) -> Option<FieldValue> {
        let value = match column {
            "cr_min" => self.cr_min,
            "cr_max" => self.cr_max,
            "cd_min" => self.cd_min,
            "cd_max" => self.cd_max,
            "dr_min" => self.dr_min,
            "dr_max" => self.dr_max,
            "fl_min" => self.fl_min,
            "fl_max" => self.fl_max,
            "hr_min" => self.hr_min,
            "hr_max" => self.hr_max,
            "ma_min" => self.ma_min,
            "ma_max" => self.ma_max,
            "pe_min" => self.pe_min,
            "pe_max" => self.pe_max,
            "oq_min" => self.oq_min,
            "oq_max" => self.oq_max,
            "sr_min" => self.sr_min,
            "sr_max" => self.sr_max,
            "ut_min" => self.ut_min,
            "ut_max" => self.ut_max,
            "er_min" => self.er_min,
            "er_max" => self.er_max,
            _ => return None,
        };
        Some(value.into())
    }
}

/// A resource type definition with stat ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    #[sqlx(rename = "resource_type")]
    pub key: String,
    #[sqlx(rename = "resource_type_name")]
    pub name: String,
    #[sqlx(rename = "resource_category")]
    pub category: String,
    #[sqlx(rename = "resource_group")]
    pub group: String,
    pub enterable: bool,
    pub max_types: i16,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ranges: StatRanges,
    pub container_type: String,
    pub inventory_type: String,
    pub specific_planet: i16,
}

/// Data needed to create a new resource type. The natural key is part of
/// the payload.
#[derive(Debug, Clone)]
pub struct NewResourceType {
    pub key: String,
    pub name: String,
    pub category: String,
    pub group: String,
    pub enterable: bool,
    pub max_types: i16,
    pub ranges: StatRanges,
    pub container_type: String,
    pub inventory_type: String,
    pub specific_planet: i16,
}

/// Sparse patch for an existing resource type. The key itself is
/// immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateResourceType {
    pub name: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    pub enterable: Option<bool>,
    pub max_types: Option<i16>,
    pub ranges: Option<StatRanges>,
    pub container_type: Option<String>,
    pub inventory_type: Option<String>,
    pub specific_planet: Option<i16>,
}

sort_keys! {
    /// Sort keys accepted by resource type queries.
    pub enum ResourceTypeSort {
        ResourceType => "resource_type",
        Name => "resource_type_name",
        Category => "resource_category",
        Group => "resource_group",
        Enterable => "enterable",
    }
}

/// The fields a resource type query can be filtered on.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeFilter {
    pub key: Option<String>,
    /// Case-sensitive substring match against the display name.
    pub name: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    pub enterable: Option<bool>,
    pub container_type: Option<String>,
}

impl QueryFilter for ResourceTypeFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(key) = &self.key {
            preds.push(Predicate::Eq {
                column: "resource_type",
                value: key.clone().into(),
            });
        }
        if let Some(name) = &self.name {
            preds.push(Predicate::Contains {
                column: "resource_type_name",
                needle: name.clone(),
            });
        }
        if let Some(category) = &self.category {
            preds.push(Predicate::Eq {
                column: "resource_category",
                value: category.clone().into(),
            });
        }
        if let Some(group) = &self.group {
            preds.push(Predicate::Eq {
                column: "resource_group",
                value: group.clone().into(),
            });
        }
        if let Some(enterable) = self.enterable {
            preds.push(Predicate::Eq {
                column: "enterable",
                value: enterable.into(),
            });
        }
        if let Some(container_type) = &self.container_type {
            preds.push(Predicate::Eq {
                column: "container_type",
                value: container_type.clone().into(),
            });
        }
        preds
    }
}

impl Record for ResourceType {
    type Key = String;
    type Sort = ResourceTypeSort;
    type Filter = ResourceTypeFilter;

    fn table() -> &'static TableSpec {
        &TABLE
    }

    fn key(&self) -> String {
        self.key.clone()
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "resource_type" => Some(self.key.clone().into()),
            "resource_type_name" => Some(self.name.clone().into()),
            "resource_category" => Some(self.category.clone().into()),
            "resource_group" => Some(self.group.clone().into()),
            "enterable" => Some(self.enterable.into()),
            "max_types" => Some(self.max_types.into()),
            "container_type" => Some(self.container_type.clone().into()),
            "inventory_type" => Some(self.inventory_type.clone().into()),
            "specific_planet" => Some(self.specific_planet.into()),
            other => self.ranges.field(other),
        }
    }
}

impl Entity for ResourceType {
    type New = NewResourceType;
    type Update = UpdateResourceType;

    fn create(new: NewResourceType, _now: DateTime<Utc>) -> Self {
        // Catalog rows carry no audit timestamps; the key comes from the
        // payload rather than being server-assigned.
        ResourceType {
            key: new.key,
            name: new.name,
            category: new.category,
            group: new.group,
            enterable: new.enterable,
            max_types: new.max_types,
            ranges: new.ranges,
            container_type: new.container_type,
            inventory_type: new.inventory_type,
            specific_planet: new.specific_planet,
        }
    }

    fn apply(&mut self, update: UpdateResourceType) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(group) = update.group {
            self.group = group;
        }
        if let Some(enterable) = update.enterable {
            self.enterable = enterable;
        }
        if let Some(max_types) = update.max_types {
            self.max_types = max_types;
        }
        if let Some(ranges) = update.ranges {
            self.ranges = ranges;
        }
        if let Some(container_type) = update.container_type {
            self.container_type = container_type;
        }
        if let Some(inventory_type) = update.inventory_type {
            self.inventory_type = inventory_type;
        }
        if let Some(specific_planet) = update.specific_planet {
            self.specific_planet = specific_planet;
        }
    }

    fn touch(&mut self, _now: DateTime<Utc>) {}
}

// ---------------------------------------------------------------------------
// Externally-supplied request payloads
// ---------------------------------------------------------------------------

/// Wire payload for creating a resource type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewResourceTypeRequest {
    #[validate(length(min = 1, message = "resourceType is required"))]
    pub resource_type: String,
    #[validate(length(min = 1, message = "resourceTypeName is required"))]
    pub resource_type_name: String,
    pub resource_category: String,
    pub resource_group: String,
    pub enterable: bool,
    pub max_types: i16,
    #[serde(flatten)]
    pub ranges: StatRanges,
    pub container_type: String,
    pub inventory_type: String,
    pub specific_planet: i16,
}

impl NewResourceTypeRequest {
    pub fn to_domain(&self) -> Result<NewResourceType, Error> {
        self.validate()?;
        Ok(NewResourceType {
            key: self.resource_type.clone(),
            name: self.resource_type_name.clone(),
            category: self.resource_category.clone(),
            group: self.resource_group.clone(),
            enterable: self.enterable,
            max_types: self.max_types,
            ranges: self.ranges,
            container_type: self.container_type.clone(),
            inventory_type: self.inventory_type.clone(),
            specific_planet: self.specific_planet,
        })
    }
}

/// Wire payload for patching a resource type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceTypeRequest {
    pub resource_type_name: Option<String>,
    pub resource_category: Option<String>,
    pub resource_group: Option<String>,
    pub enterable: Option<bool>,
    pub max_types: Option<i16>,
    pub ranges: Option<StatRanges>,
    pub container_type: Option<String>,
    pub inventory_type: Option<String>,
    pub specific_planet: Option<i16>,
}

impl UpdateResourceTypeRequest {
    pub fn to_domain(&self) -> Result<UpdateResourceType, Error> {
        if let Some(name) = &self.resource_type_name {
            if name.is_empty() {
                return Err(Error::failed_precondition(
                    "resourceTypeName",
                    "must not be empty",
                ));
            }
        }
        Ok(UpdateResourceType {
            name: self.resource_type_name.clone(),
            category: self.resource_category.clone(),
            group: self.resource_group.clone(),
            enterable: self.enterable,
            max_types: self.max_types,
            ranges: self.ranges,
            container_type: self.container_type.clone(),
            inventory_type: self.inventory_type.clone(),
            specific_planet: self.specific_planet,
        })
    }
}

/// One item of a bulk resource type update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResourceTypeWithId {
    pub id: String,
    pub data: UpdateResourceTypeRequest,
}

pub fn convert_new_batch(
    items: Vec<NewResourceTypeRequest>,
) -> Result<Vec<NewResourceType>, Error> {
    bulk::convert_batch(items, |index, item| {
        item.to_domain()
            .map_err(|err| BulkItemError::new(index, "item", err))
    })
}

pub fn convert_update_batch(
    items: Vec<UpdateResourceTypeWithId>,
) -> Result<Vec<(String, UpdateResourceType)>, Error> {
    bulk::convert_batch(items, |index, item| {
        if item.id.is_empty() {
            return Err(BulkItemError::new(index, "id", "key must not be empty"));
        }
        let data = item
            .data
            .to_domain()
            .map_err(|err| BulkItemError::new(index, "data", err))?;
        Ok((item.id, data))
    })
}

pub fn convert_delete_batch(ids: Vec<String>) -> Result<Vec<String>, Error> {
    bulk::convert_batch(ids, |index, id| {
        if id.is_empty() {
            return Err(BulkItemError::new(index, "id", "key must not be empty"));
        }
        Ok(id)
    })
}
