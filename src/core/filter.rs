//! Query filter predicates
//!
//! A filter is a sparse set of optional predicates: absent fields impose
//! no constraint, present fields each contribute exactly one predicate,
//! and all predicates are combined with logical AND, never OR. An empty
//! filter therefore matches every row.
//!
//! Column names inside predicates are always `&'static str` constants
//! supplied by the domain modules, which keeps identifier injection
//! impossible by construction: user input only ever flows into bound
//! values.

use crate::core::field::FieldValue;

/// A single AND-ed constraint against one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match: `column = $value`.
    Eq {
        column: &'static str,
        value: FieldValue,
    },

    /// Case-sensitive substring match: `column LIKE '%' || $needle || '%'`.
    Contains {
        column: &'static str,
        needle: String,
    },

    /// Floor semantics: `column >= $value`. Used for minimum-stat
    /// filtering; this is a deliberate domain choice, not equality.
    AtLeast {
        column: &'static str,
        value: FieldValue,
    },

    /// Ceiling semantics: `column <= $value`.
    AtMost {
        column: &'static str,
        value: FieldValue,
    },

    /// Set membership resolved through another table:
    /// `column IN (SELECT select_column FROM table WHERE match_column = $value)`.
    MemberOf {
        column: &'static str,
        table: &'static str,
        select_column: &'static str,
        match_column: &'static str,
        value: String,
    },
}

impl Predicate {
    /// The column this predicate constrains.
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::Contains { column, .. }
            | Predicate::AtLeast { column, .. }
            | Predicate::AtMost { column, .. }
            | Predicate::MemberOf { column, .. } => column,
        }
    }
}

/// A sparse, per-field-optional filter over one entity type.
///
/// Domain modules implement this on plain structs of `Option` fields;
/// the stores only ever see the resulting predicate list.
pub trait QueryFilter: Default + Send + Sync {
    /// Render the present fields into AND-combined predicates.
    fn predicates(&self) -> Vec<Predicate>;

    /// True when no field is set, i.e. the filter matches all rows.
    fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        min_level: Option<i16>,
        name: Option<String>,
    }

    impl QueryFilter for Sample {
        fn predicates(&self) -> Vec<Predicate> {
            let mut preds = Vec::new();
            if let Some(level) = self.min_level {
                preds.push(Predicate::AtLeast {
                    column: "group_level",
                    value: level.into(),
                });
            }
            if let Some(name) = &self.name {
                preds.push(Predicate::Contains {
                    column: "group_name",
                    needle: name.clone(),
                });
            }
            preds
        }
    }

    #[test]
    fn test_default_filter_is_empty() {
        assert!(Sample::default().is_empty());
        assert!(Sample::default().predicates().is_empty());
    }

    #[test]
    fn test_present_fields_become_predicates() {
        let filter = Sample {
            min_level: Some(3),
            name: Some("ore".into()),
        };
        let preds = filter.predicates();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].column(), "group_level");
        assert_eq!(preds[1].column(), "group_name");
        assert!(!filter.is_empty());
    }
}
