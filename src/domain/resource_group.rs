//! Resource group domain
//!
//! A resource group is a node in the resource type hierarchy ("mineral",
//! "metal ferrous", ...). Groups drive the set-membership filter on
//! resources: filtering resources by group matches every type the group
//! contains.

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
    table: "resource_groups",
    entity: "resource group",
    key_column: "resource_group",
    lookup_column: "group_name",
    columns: &[
        "resource_group",
        "group_name",
        "group_level",
        "group_order",
        "container_type",
    ],
    update_columns: &["group_name", "group_level", "group_order", "container_type"],
};

/// A node in the resource type hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[sqlx(rename = "resource_group")]
    pub key: String,
    pub group_name: String,
    pub group_level: i16,
    pub group_order: i16,
    pub container_type: String,
}

/// Data needed to create a new resource group.
#[derive(Debug, Clone)]
pub struct NewResourceGroup {
    pub key: String,
    pub group_name: String,
    pub group_level: i16,
    pub group_order: i16,
    pub container_type: String,
}

/// Sparse patch for an existing resource group; the key is immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateResourceGroup {
    pub group_name: Option<String>,
    pub group_level: Option<i16>,
    pub group_order: Option<i16>,
    pub container_type: Option<String>,
}

sort_keys! {
    /// Sort keys accepted by resource group queries.
    pub enum ResourceGroupSort {
        GroupOrder => "group_order",
        ResourceGroup => "resource_group",
        GroupName => "group_name",
        GroupLevel => "group_level",
    }
}

/// The fields a resource group query can be filtered on.
#[derive(Debug, Clone, Default)]
pub struct ResourceGroupFilter {
    pub key: Option<String>,
    /// Case-sensitive substring match against the group name.
    pub group_name: Option<String>,
    pub group_level: Option<i16>,
    pub container_type: Option<String>,
}

impl QueryFilter for ResourceGroupFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(key) = &self.key {
            preds.push(Predicate::Eq {
                column: "resource_group",
                value: key.clone().into(),
            });
        }
        if let Some(name) = &self.group_name {
            preds.push(Predicate::Contains {
                column: "group_name",
                needle: name.clone(),
            });
        }
        if let Some(level) = self.group_level {
            preds.push(Predicate::Eq {
                column: "group_level",
                value: level.into(),
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

impl Record for ResourceGroup {
    type Key = String;
    type Sort = ResourceGroupSort;
    type Filter = ResourceGroupFilter;

    fn table() -> &'static TableSpec {
        &TABLE
    }

    fn key(&self) -> String {
        self.key.clone()
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "resource_group" => Some(self.key.clone().into()),
            "group_name" => Some(self.group_name.clone().into()),
            "group_level" => Some(self.group_level.into()),
            "group_order" => Some(self.group_order.into()),
            "container_type" => Some(self.container_type.clone().into()),
            _ => None,
        }
    }
}

impl Entity for ResourceGroup {
    type New = NewResourceGroup;
    type Update = UpdateResourceGroup;

    fn create(new: NewResourceGroup, _now: DateTime<Utc>) -> Self {
        // Hierarchy rows carry no audit timestamps.
        ResourceGroup {
            key: new.key,
            group_name: new.group_name,
            group_level: new.group_level,
            group_order: new.group_order,
            container_type: new.container_type,
        }
    }

    fn apply(&mut self, update: UpdateResourceGroup) {
        if let Some(name) = update.group_name {
            self.group_name = name;
        }
        if let Some(level) = update.group_level {
            self.group_level = level;
        }
        if let Some(order) = update.group_order {
            self.group_order = order;
        }
        if let Some(container_type) = update.container_type {
            self.container_type = container_type;
        }
    }

    fn touch(&mut self, _now: DateTime<Utc>) {}
}

// ---------------------------------------------------------------------------
// Externally-supplied request payloads
// ---------------------------------------------------------------------------

/// Wire payload for creating a resource group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewResourceGroupRequest {
    #[validate(length(min = 1, message = "resourceGroup is required"))]
    pub resource_group: String,
    #[validate(length(min = 1, message = "groupName is required"))]
    pub group_name: String,
    pub group_level: i16,
    pub group_order: i16,
    pub container_type: String,
}

impl NewResourceGroupRequest {
    pub fn to_domain(&self) -> Result<NewResourceGroup, Error> {
        self.validate()?;
        Ok(NewResourceGroup {
            key: self.resource_group.clone(),
            group_name: self.group_name.clone(),
            group_level: self.group_level,
            group_order: self.group_order,
            container_type: self.container_type.clone(),
        })
    }
}

/// Wire payload for patching a resource group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceGroupRequest {
    pub group_name: Option<String>,
    pub group_level: Option<i16>,
    pub group_order: Option<i16>,
    pub container_type: Option<String>,
}

impl UpdateResourceGroupRequest {
    pub fn to_domain(&self) -> Result<UpdateResourceGroup, Error> {
        if let Some(name) = &self.group_name {
            if name.is_empty() {
                return Err(Error::failed_precondition("groupName", "must not be empty"));
            }
        }
        Ok(UpdateResourceGroup {
            group_name: self.group_name.clone(),
            group_level: self.group_level,
            group_order: self.group_order,
            container_type: self.container_type.clone(),
        })
    }
}

/// One item of a bulk resource group update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResourceGroupWithId {
    pub id: String,
    pub data: UpdateResourceGroupRequest,
}

pub fn convert_new_batch(
    items: Vec<NewResourceGroupRequest>,
) -> Result<Vec<NewResourceGroup>, Error> {
    bulk::convert_batch(items, |index, item| {
        item.to_domain()
            .map_err(|err| BulkItemError::new(index, "item", err))
    })
}

pub fn convert_update_batch(
    items: Vec<UpdateResourceGroupWithId>,
) -> Result<Vec<(String, UpdateResourceGroup)>, Error> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_patch() {
        let mut group = ResourceGroup::create(
            NewResourceGroup {
                key: "mineral".to_string(),
                group_name: "Mineral".to_string(),
                group_level: 1,
                group_order: 10,
                container_type: "ore".to_string(),
            },
            Utc::now(),
        );

        group.apply(UpdateResourceGroup {
            group_order: Some(20),
            ..Default::default()
        });

        assert_eq!(group.group_order, 20);
        assert_eq!(group.group_name, "Mineral");
        assert_eq!(group.key, "mineral");
    }

    #[test]
    fn test_default_sort_is_group_order() {
        use crate::core::order::{Direction, OrderBy};
        let order = OrderBy::<ResourceGroupSort>::default();
        assert_eq!(order.column(), "group_order");
        assert_eq!(order.direction, Direction::Asc);
    }
}
