//! User domain
//!
//! A user account with a validated name, a unique email (the natural
//! lookup key), a set of typed roles and an optional guild affiliation.
//! Authentication concerns like passwords and tokens live outside this
//! core.

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
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

static TABLE: TableSpec = TableSpec {
    table: "users",
    entity: "user",
    key_column: "user_id",
    lookup_column: "email",
    columns: &[
        "user_id",
        "name",
        "email",
        "roles",
        "guild",
        "enabled",
        "date_created",
        "date_updated",
    ],
    update_columns: &[
        "name",
        "email",
        "roles",
        "guild",
        "enabled",
        "date_updated",
    ],
};

/// The set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a stored or wire-format role value.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(Error::failed_precondition(
                "roles",
                format!("unknown role {other:?}"),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Information about an individual user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: Name,
    pub email: String,
    pub roles: Vec<Role>,
    pub guild: Option<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

// Roles live in a TEXT[] column and need parsing on the way out, so the
// row mapping is written by hand instead of derived.
impl<'r> sqlx::FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let name: String = row.try_get("name")?;
        let name = Name::parse(&name).map_err(|err| sqlx::Error::ColumnDecode {
            index: "name".to_string(),
            source: Box::new(err),
        })?;

        let roles: Vec<String> = row.try_get("roles")?;
        let roles = roles
            .iter()
            .map(|role| Role::parse(role))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| sqlx::Error::ColumnDecode {
                index: "roles".to_string(),
                source: Box::new(err),
            })?;

        Ok(User {
            id: row.try_get("user_id")?,
            name,
            email: row.try_get("email")?,
            roles,
            guild: row.try_get("guild")?,
            enabled: row.try_get("enabled")?,
            date_created: row.try_get("date_created")?,
            date_updated: row.try_get("date_updated")?,
        })
    }
}

/// Data needed to create a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Name,
    pub email: String,
    pub roles: Vec<Role>,
    pub guild: Option<String>,
}

/// Sparse patch for an existing user; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<Name>,
    pub email: Option<String>,
    pub roles: Option<Vec<Role>>,
    pub guild: Option<String>,
    pub enabled: Option<bool>,
}

sort_keys! {
    /// Sort keys accepted by user queries.
    pub enum UserSort {
        UserId => "user_id",
        Name => "name",
        Email => "email",
        Guild => "guild",
        DateCreated => "date_created",
        Enabled => "enabled",
    }
}

/// The fields a user query can be filtered on.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    /// Case-sensitive substring match against the user name.
    pub name: Option<String>,
    pub email: Option<String>,
    pub guild: Option<String>,
    pub enabled: Option<bool>,
    pub start_created_date: Option<DateTime<Utc>>,
    pub end_created_date: Option<DateTime<Utc>>,
}

impl QueryFilter for UserFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(id) = self.id {
            preds.push(Predicate::Eq {
                column: "user_id",
                value: id.into(),
            });
        }
        if let Some(name) = &self.name {
            preds.push(Predicate::Contains {
                column: "name",
                needle: name.clone(),
            });
        }
        if let Some(email) = &self.email {
            preds.push(Predicate::Eq {
                column: "email",
                value: email.clone().into(),
            });
        }
        if let Some(guild) = &self.guild {
            preds.push(Predicate::Eq {
                column: "guild",
                value: guild.clone().into(),
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

impl Record for User {
    type Key = Uuid;
    type Sort = UserSort;
    type Filter = UserFilter;

    fn table() -> &'static TableSpec {
        &TABLE
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "user_id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "email" => Some(self.email.clone().into()),
            "roles" => Some(FieldValue::TextArray(
                self.roles.iter().map(|role| role.to_string()).collect(),
            )),
            "guild" => Some(self.guild.clone().into()),
            "enabled" => Some(self.enabled.into()),
            "date_created" => Some(self.date_created.into()),
            "date_updated" => Some(self.date_updated.into()),
            _ => None,
        }
    }
}

impl Entity for User {
    type New = NewUser;
    type Update = UpdateUser;

    fn create(new: NewUser, now: DateTime<Utc>) -> Self {
        User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            roles: new.roles,
            guild: new.guild,
            enabled: true,
            date_created: now,
            date_updated: now,
        }
    }

    fn apply(&mut self, update: UpdateUser) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(roles) = update.roles {
            self.roles = roles;
        }
        if let Some(guild) = update.guild {
            self.guild = Some(guild);
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

/// Wire payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub roles: Vec<String>,
    pub guild: Option<String>,
}

impl NewUserRequest {
    pub fn to_domain(&self) -> Result<NewUser, Error> {
        self.validate()?;
        let roles = self
            .roles
            .iter()
            .map(|role| Role::parse(role))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NewUser {
            name: Name::parse(&self.name)?,
            email: self.email.clone(),
            roles,
            guild: self.guild.clone(),
        })
    }
}

/// Wire payload for patching a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub guild: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateUserRequest {
    pub fn to_domain(&self) -> Result<UpdateUser, Error> {
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(Error::failed_precondition(
                    "email",
                    "email must be a valid address",
                ));
            }
        }
        let roles = self
            .roles
            .as_ref()
            .map(|raw| raw.iter().map(|role| Role::parse(role)).collect())
            .transpose()?;
        Ok(UpdateUser {
            name: self.name.as_deref().map(Name::parse).transpose()?,
            email: self.email.clone(),
            roles,
            guild: self.guild.clone(),
            enabled: self.enabled,
        })
    }
}

/// One item of a bulk user update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserWithId {
    pub id: String,
    pub data: UpdateUserRequest,
}

pub fn convert_new_batch(items: Vec<NewUserRequest>) -> Result<Vec<NewUser>, Error> {
    bulk::convert_batch(items, |index, item| {
        item.to_domain()
            .map_err(|err| BulkItemError::new(index, "item", err))
    })
}

pub fn convert_update_batch(
    items: Vec<UpdateUserWithId>,
) -> Result<Vec<(Uuid, UpdateUser)>, Error> {
    bulk::convert_batch(items, |index, item| {
        let id = parse_uuid("id", &item.id).map_err(|err| BulkItemError::new(index, "id", err))?;
        let data = item
            .data
            .to_domain()
            .map_err(|err| BulkItemError::new(index, "data", err))?;
        Ok((id, data))
    })
}

pub fn convert_delete_batch(ids: Vec<String>) -> Result<Vec<Uuid>, Error> {
    bulk::convert_batch(ids, |index, id| {
        parse_uuid("id", &id).map_err(|err| BulkItemError::new(index, "id", err))
    })
}
