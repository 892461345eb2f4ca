//! Validated ordering
//!
//! Results can only be ordered by keys from a closed, per-entity allow-list:
//! each entity declares a sort-key enum (via [`sort_keys!`]) whose variants
//! map user-facing key strings to physical sort columns. Unknown keys fail
//! validation and are never passed through to the query engine. This is
//! the primary defense against ORDER BY injection.

use crate::core::error::Error;
use std::fmt;

/// Sort direction, ascending unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// The SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Direction::Asc),
            "DESC" => Some(Direction::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A closed set of sort keys for one entity type.
///
/// Implemented by the enums generated with [`sort_keys!`]; the first
/// declared variant is the entity's default sort key.
pub trait SortKey: Copy + Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// The physical sort column for this key.
    fn column(self) -> &'static str;

    /// Resolve a user-facing key string, `None` for unknown keys.
    fn parse(key: &str) -> Option<Self>;

    /// The entity's default sort key.
    fn default_key() -> Self;
}

/// A validated (sort key, direction) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBy<K: SortKey> {
    pub key: K,
    pub direction: Direction,
}

impl<K: SortKey> OrderBy<K> {
    pub fn new(key: K, direction: Direction) -> Self {
        Self { key, direction }
    }

    /// Parse an `"key"` or `"key,direction"` expression.
    ///
    /// `None` (or an empty string) yields the entity default: first
    /// declared key, ascending. Unknown keys or directions are a
    /// validation error, never passed through.
    pub fn parse(input: Option<&str>) -> Result<Self, Error> {
        let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };

        let (key_part, dir_part) = match raw.split_once(',') {
            Some((k, d)) => (k.trim(), Some(d)),
            None => (raw, None),
        };

        let key = K::parse(key_part).ok_or_else(|| {
            Error::failed_precondition("orderBy", format!("unknown order field {key_part:?}"))
        })?;

        let direction = match dir_part {
            Some(d) => Direction::parse(d).ok_or_else(|| {
                Error::failed_precondition("orderBy", format!("unknown direction {:?}", d.trim()))
            })?,
            None => Direction::Asc,
        };

        Ok(Self { key, direction })
    }

    /// The physical sort column resolved through the allow-list.
    pub fn column(&self) -> &'static str {
        self.key.column()
    }
}

impl<K: SortKey> Default for OrderBy<K> {
    fn default() -> Self {
        Self {
            key: K::default_key(),
            direction: Direction::Asc,
        }
    }
}

/// Declare a closed sort-key enum for one entity.
///
/// The first variant is the entity's default sort key. Each variant maps
/// a user-facing key string to itself; the physical column follows the
/// arrow.
///
/// # Example
///
/// ```rust,ignore
/// sort_keys! {
///     /// Sort keys accepted by galaxy queries.
///     pub enum GalaxySort {
///         GalaxyId => "galaxy_id",
///         Name => "galaxy_name",
///     }
/// }
/// ```
#[macro_export]
macro_rules! sort_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident => $key:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $( $variant ),+
        }

        impl $crate::core::order::SortKey for $name {
            fn column(self) -> &'static str {
                match self {
                    $( Self::$variant => $key ),+
                }
            }

            fn parse(key: &str) -> Option<Self> {
                match key {
                    $( $key => Some(Self::$variant), )+
                    _ => None,
                }
            }

            fn default_key() -> Self {
                $crate::sort_keys!(@first $( $variant )+)
            }
        }
    };
    (@first $first:ident $( $rest:ident )*) => { Self::$first };
}
