//! Resource domain
//!
//! A resource is a spawned material reported on one galaxy, carrying
//! eleven quality stats. Stat filters use floor semantics (>=): callers
//! filter for "at least this good", never for an exact roll. Group
//! filtering resolves through the resource type table, since a group is
//! a set of types.

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
    table: "resources",
    entity: "resource",
    key_column: "resource_id",
    lookup_column: "resource_name",
    columns: &[
        "resource_id",
        "resource_name",
        "galaxy_id",
        "added_at",
        "updated_at",
        "added_user_id",
        "resource_type",
        "unavailable_at",
        "unavailable_user_id",
        "verified",
        "verified_user_id",
        "cr",
        "cd",
        "dr",
        "fl",
        "hr",
        "ma",
        "pe",
        "oq",
        "sr",
        "ut",
        "er",
    ],
    update_columns: &[
        "resource_name",
        "updated_at",
        "unavailable_at",
        "unavailable_user_id",
        "verified",
        "verified_user_id",
        "cr",
        "cd",
        "dr",
        "fl",
        "hr",
        "ma",
        "pe",
        "oq",
        "sr",
        "ut",
        "er",
    ],
};

/// The eleven quality stats carried by every resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stats {
    pub cr: i16,
    pub cd: i16,
    pub dr: i16,
    pub fl: i16,
    pub hr: i16,
    pub ma: i16,
    pub pe: i16,
    pub oq: i16,
    pub sr: i16,
    pub ut: i16,
    pub er: i16,
}

/// Information about an individual resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[sqlx(rename = "resource_id")]
    pub id: Uuid,
    #[sqlx(rename = "resource_name")]
    #[sqlx(try_from = "String")]
    pub name: Name,
    pub galaxy_id: Uuid,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub added_user_id: Uuid,
    pub resource_type: String,
    pub unavailable_at: Option<DateTime<Utc>>,
    pub unavailable_user_id: Option<Uuid>,
    pub verified: bool,
    pub verified_user_id: Option<Uuid>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub stats: Stats,
}

/// Data needed to report a new resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub name: Name,
    pub galaxy_id: Uuid,
    pub added_user_id: Uuid,
    pub resource_type: String,
    pub stats: Stats,
}

/// Sparse patch for an existing resource; `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateResource {
    pub name: Option<Name>,
    pub unavailable_at: Option<DateTime<Utc>>,
    pub unavailable_user_id: Option<Uuid>,
    pub verified: Option<bool>,
    pub verified_user_id: Option<Uuid>,
    pub cr: Option<i16>,
    pub cd: Option<i16>,
    pub dr: Option<i16>,
    pub fl: Option<i16>,
    pub hr: Option<i16>,
    pub ma: Option<i16>,
    pub pe: Option<i16>,
    pub oq: Option<i16>,
    pub sr: Option<i16>,
    pub ut: Option<i16>,
    pub er: Option<i16>,
}

sort_keys! {
    /// Sort keys accepted by resource queries.
    pub enum ResourceSort {
        ResourceId => "resource_id",
        Name => "resource_name",
        ResourceType => "resource_type",
        Verified => "verified",
        UnavailableAt => "unavailable_at",
        AddedAt => "added_at",
        Cr => "cr",
        Cd => "cd",
        Dr => "dr",
        Fl => "fl",
        Hr => "hr",
        Ma => "ma",
        Pe => "pe",
        Oq => "oq",
        Sr => "sr",
        Ut => "ut",
        Er => "er",
    }
}

/// The fields a resource query can be filtered on.
///
/// `min_*` stat filters match resources whose stat is at least the given
/// value. `resource_group` matches any resource whose type belongs to the
/// group.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub id: Option<Uuid>,
    pub galaxy_id: Option<Uuid>,
    /// Case-sensitive substring match against the resource name.
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub resource_group: Option<String>,
    pub start_updated_date: Option<DateTime<Utc>>,
    pub end_updated_date: Option<DateTime<Utc>>,
    pub verified: Option<bool>,
    pub min_cr: Option<i16>,
    pub min_cd: Option<i16>,
    pub min_dr: Option<i16>,
    pub min_fl: Option<i16>,
    pub min_hr: Option<i16>,
    pub min_ma: Option<i16>,
    pub min_pe: Option<i16>,
    pub min_oq: Option<i16>,
    pub min_sr: Option<i16>,
    pub min_ut: Option<i16>,
    pub min_er: Option<i16>,
}

impl QueryFilter for ResourceFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut preds = Vec::new();
        if let Some(id) = self.id {
            preds.push(Predicate::Eq {
                column: "resource_id",
                value: id.into(),
            });
        }
        if let Some(galaxy_id) = self.galaxy_id {
            preds.push(Predicate::Eq {
                column: "galaxy_id",
                value: galaxy_id.into(),
            });
        }
        if let Some(name) = &self.name {
            preds.push(Predicate::Contains {
                column: "resource_name",
                needle: name.clone(),
            });
        }
        if let Some(resource_type) = &self.resource_type {
            preds.push(Predicate::Eq {
                column: "resource_type",
                value: resource_type.clone().into(),
            });
        }
        if let Some(group) = &self.resource_group {
            preds.push(Predicate::MemberOf {
                column: "resource_type",
                table: "resource_types",
                select_column: "resource_type",
                match_column: "resource_group",
                value: group.clone(),
            });
        }
        if let Some(start) = self.start_updated_date {
            preds.push(Predicate::AtLeast {
                column: "updated_at",
                value: start.into(),
            });
        }
        if let Some(end) = self.end_updated_date {
            preds.push(Predicate::AtMost {
                column: "updated_at",
                value: end.into(),
            });
        }
        if let Some(verified) = self.verified {
            preds.push(Predicate::Eq {
                column: "verified",
                value: verified.into(),
            });
        }

        let stat_minimums = [
            ("cr", self.min_cr),
            ("cd", self.min_cd),
            ("dr", self.min_dr),
            ("fl", self.min_fl),
            ("hr", self.min_hr),
            ("ma", self.min_ma),
            ("pe", self.min_pe),
            ("oq", self.min_oq),
            ("sr", self.min_sr),
            ("ut", self.min_ut),
            ("er", self.min_er),
        ];
        for (column, minimum) in stat_minimums {
            if let Some(value) = minimum {
                preds.push(Predicate::AtLeast {
                    column,
                    value: value.into(),
                });
            }
        }

        preds
    }
}

impl Record for Resource {
    type Key = Uuid;
    type Sort = ResourceSort;
    type Filter = ResourceFilter;

    fn table() -> &'static TableSpec {
        &TABLE
    }

    fn key(&self) -> Uuid {
        self.id
    }

    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "resource_id" => Some(self.id.into()),
            "resource_name" => Some(self.name.as_str().into()),
            "galaxy_id" => Some(self.galaxy_id.into()),
            "added_at" => Some(self.added_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            "added_user_id" => Some(self.added_user_id.into()),
            "resource_type" => Some(self.resource_type.clone().into()),
            "unavailable_at" => Some(self.unavailable_at.into()),
            "unavailable_user_id" => Some(self.unavailable_user_id.into()),
            "verified" => Some(self.verified.into()),
            "verified_user_id" => Some(self.verified_user_id.into()),
            "cr" => Some(self.stats.cr.into()),
            "cd" => Some(self.stats.cd.into()),
            "dr" => Some(self.stats.dr.into()),
            "fl" => Some(self.stats.fl.into()),
            "hr" => Some(self.stats.hr.into()),
            "ma" => Some(self.stats.ma.into()),
            "pe" => Some(self.stats.pe.into()),
            "oq" => Some(self.stats.oq.into()),
            "sr" => Some(self.stats.sr.into()),
            "ut" => Some(self.stats.ut.into()),
            "er" => Some(self.stats.er.into()),
            _ => None,
        }
    }
}

impl Entity for Resource {
    type New = NewResource;
    type Update = UpdateResource;

    fn create(new: NewResource, now: DateTime<Utc>) -> Self {
        Resource {
            id: Uuid::new_v4(),
            name: new.name,
            galaxy_id: new.galaxy_id,
            added_at: now,
            updated_at: now,
            added_user_id: new.added_user_id,
            resource_type: new.resource_type,
            unavailable_at: None,
            unavailable_user_id: None,
            verified: false,
            verified_user_id: None,
            stats: new.stats,
        }
    }

    fn apply(&mut self, update: UpdateResource) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(unavailable_at) = update.unavailable_at {
            self.unavailable_at = Some(unavailable_at);
        }
        if let Some(user) = update.unavailable_user_id {
            self.unavailable_user_id = Some(user);
        }
        if let Some(verified) = update.verified {
            self.verified = verified;
        }
        if let Some(user) = update.verified_user_id {
            self.verified_user_id = Some(user);
        }
        if let Some(cr) = update.cr {
            self.stats.cr = cr;
        }
        if let Some(cd) = update.cd {
            self.stats.cd = cd;
        }
        if let Some(dr) = update.dr {
            self.stats.dr = dr;
        }
        if let Some(fl) = update.fl {
            self.stats.fl = fl;
        }
        if let Some(hr) = update.hr {
            self.stats.hr = hr;
        }
        if let Some(ma) = update.ma {
            self.stats.ma = ma;
        }
        if let Some(pe) = update.pe {
            self.stats.pe = pe;
        }
        if let Some(oq) = update.oq {
            self.stats.oq = oq;
        }
        if let Some(sr) = update.sr {
            self.stats.sr = sr;
        }
        if let Some(ut) = update.ut {
            self.stats.ut = ut;
        }
        if let Some(er) = update.er {
            self.stats.er = er;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Externally-supplied request payloads
// ---------------------------------------------------------------------------

/// Wire payload for reporting a resource.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewResourceRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "galaxyId is required"))]
    pub galaxy_id: String,
    #[validate(length(min = 1, message = "addedUserId is required"))]
    pub added_user_id: String,
    #[validate(length(min = 1, message = "resourceType is required"))]
    pub resource_type: String,
    #[serde(flatten)]
    pub stats: Stats,
}

impl NewResourceRequest {
    pub fn to_domain(&self) -> Result<NewResource, Error> {
        self.validate()?;
        Ok(NewResource {
            name: Name::parse(&self.name)?,
            galaxy_id: parse_uuid("galaxyId", &self.galaxy_id)?,
            added_user_id: parse_uuid("addedUserId", &self.added_user_id)?,
            resource_type: self.resource_type.clone(),
            stats: self.stats,
        })
    }
}

/// Wire payload for patching a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    pub name: Option<String>,
    pub unavailable_at: Option<DateTime<Utc>>,
    pub unavailable_user_id: Option<String>,
    pub verified: Option<bool>,
    pub verified_user_id: Option<String>,
    pub cr: Option<i16>,
    pub cd: Option<i16>,
    pub dr: Option<i16>,
    pub fl: Option<i16>,
    pub hr: Option<i16>,
    pub ma: Option<i16>,
    pub pe: Option<i16>,
    pub oq: Option<i16>,
    pub sr: Option<i16>,
    pub ut: Option<i16>,
    pub er: Option<i16>,
}

impl UpdateResourceRequest {
    pub fn to_domain(&self) -> Result<UpdateResource, Error> {
        Ok(UpdateResource {
            name: self.name.as_deref().map(Name::parse).transpose()?,
            unavailable_at: self.unavailable_at,
            unavailable_user_id: self
                .unavailable_user_id
                .as_deref()
                .map(|raw| parse_uuid("unavailableUserId", raw))
                .transpose()?,
            verified: self.verified,
            verified_user_id: self
                .verified_user_id
                .as_deref()
                .map(|raw| parse_uuid("verifiedUserId", raw))
                .transpose()?,
            cr: self.cr,
            cd: self.cd,
            dr: self.dr,
            fl: self.fl,
            hr: self.hr,
            ma: self.ma,
            pe: self.pe,
            oq: self.oq,
            sr: self.sr,
            ut: self.ut,
            er: self.er,
        })
    }
}

/// One item of a bulk resource update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResourceWithId {
    pub id: String,
    pub data: UpdateResourceRequest,
}

pub fn convert_new_batch(items: Vec<NewResourceRequest>) -> Result<Vec<NewResource>, Error> {
    bulk::convert_batch(items, |index, item| {
        item.to_domain()
            .map_err(|err| BulkItemError::new(index, "item", err))
    })
}

pub fn convert_update_batch(
    items: Vec<UpdateResourceWithId>,
) -> Result<Vec<(Uuid, UpdateResource)>, Error> {
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
