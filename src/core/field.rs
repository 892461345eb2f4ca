//! Polymorphic column values
//!
//! `FieldValue` is the currency between a domain record and the storage
//! layer: records expose their columns as `FieldValue`s, the PostgreSQL
//! store binds them as statement parameters, and the in-memory store
//! evaluates filter predicates and sort orders against them.
//!
//! Nullable columns get their own variants (`NullableUuid`, `NullableText`,
//! `NullableTimestamp`) because a NULL bind parameter still needs a
//! concrete SQL type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A single column value of any supported type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Uuid(Uuid),
    NullableUuid(Option<Uuid>),
    Text(String),
    NullableText(Option<String>),
    SmallInt(i16),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    NullableTimestamp(Option<DateTime<Utc>>),
    TextArray(Vec<String>),
}

/// Normalized scalar view used for comparisons across the plain and
/// nullable variants of the same underlying type.
enum Scalar<'a> {
    Uuid(Uuid),
    Text(&'a str),
    SmallInt(i16),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Get the value as a string slice if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::NullableText(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            FieldValue::NullableUuid(Some(u)) => Some(*u),
            _ => None,
        }
    }

    /// Get the value as a 16-bit integer if possible.
    pub fn as_small_int(&self) -> Option<i16> {
        match self {
            FieldValue::SmallInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the value as a boolean if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as a timestamp if possible.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            FieldValue::NullableTimestamp(Some(t)) => Some(*t),
            _ => None,
        }
    }

    /// Check whether the value is a SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            FieldValue::NullableUuid(None)
                | FieldValue::NullableText(None)
                | FieldValue::NullableTimestamp(None)
        )
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        match self {
            FieldValue::Uuid(u) => Some(Scalar::Uuid(*u)),
            FieldValue::NullableUuid(u) => u.map(Scalar::Uuid),
            FieldValue::Text(s) => Some(Scalar::Text(s)),
            FieldValue::NullableText(s) => s.as_deref().map(Scalar::Text),
            FieldValue::SmallInt(n) => Some(Scalar::SmallInt(*n)),
            FieldValue::Bool(b) => Some(Scalar::Bool(*b)),
            FieldValue::Timestamp(t) => Some(Scalar::Timestamp(*t)),
            FieldValue::NullableTimestamp(t) => t.map(Scalar::Timestamp),
            FieldValue::TextArray(_) => None,
        }
    }

    /// Compare two values of the same underlying type.
    ///
    /// NULLs compare greater than any value (NULLS LAST in ascending
    /// order, matching the PostgreSQL default). Two NULLs, mismatched
    /// types and non-scalar values are not comparable and yield `None`.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self.scalar(), other.scalar()) {
            (Some(a), Some(b)) => match (a, b) {
                (Scalar::Uuid(a), Scalar::Uuid(b)) => Some(a.cmp(&b)),
                (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
                (Scalar::SmallInt(a), Scalar::SmallInt(b)) => Some(a.cmp(&b)),
                (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(&b)),
                (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(&b)),
                _ => None,
            },
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => None,
        }
    }

    /// Equality across the plain and nullable variants of the same type.
    /// NULL never matches anything, NULL included.
    pub fn matches(&self, other: &FieldValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<Option<Uuid>> for FieldValue {
    fn from(value: Option<Uuid>) -> Self {
        FieldValue::NullableUuid(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        FieldValue::NullableText(value)
    }
}

impl From<i16> for FieldValue {
    fn from(value: i16) -> Self {
        FieldValue::SmallInt(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Option<DateTime<Utc>>> for FieldValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        FieldValue::NullableTimestamp(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::TextArray(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(FieldValue::Uuid(id).as_uuid(), Some(id));
        assert_eq!(FieldValue::Text("hi".into()).as_text(), Some("hi"));
        assert_eq!(FieldValue::SmallInt(7).as_small_int(), Some(7));
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Text("hi".into()).as_uuid(), None);
    }

    #[test]
    fn test_null_detection() {
        assert!(FieldValue::NullableUuid(None).is_null());
        assert!(FieldValue::NullableText(None).is_null());
        assert!(!FieldValue::NullableText(Some("x".into())).is_null());
        assert!(!FieldValue::SmallInt(0).is_null());
    }

    #[test]
    fn test_compare_same_type() {
        let a = FieldValue::SmallInt(3);
        let b = FieldValue::SmallInt(9);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(b.compare(&a), Some(Ordering::Greater));
        assert_eq!(a.compare(&a.clone()), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_across_nullable_variants() {
        let id = Uuid::new_v4();
        let plain = FieldValue::Uuid(id);
        let nullable = FieldValue::NullableUuid(Some(id));
        assert!(plain.matches(&nullable));
    }

    #[test]
    fn test_nulls_sort_last() {
        let value = FieldValue::Timestamp(Utc::now());
        let null = FieldValue::NullableTimestamp(None);
        assert_eq!(value.compare(&null), Some(Ordering::Less));
        assert_eq!(null.compare(&value), Some(Ordering::Greater));
    }

    #[test]
    fn test_null_never_matches_null() {
        let a = FieldValue::NullableText(None);
        let b = FieldValue::NullableText(None);
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_mismatched_types_do_not_compare() {
        let a = FieldValue::Text("1".into());
        let b = FieldValue::SmallInt(1);
        assert_eq!(a.compare(&b), None);
        assert!(!a.matches(&b));
    }
}
