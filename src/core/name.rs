//! Validated name primitive
//!
//! Entity names arrive from the outside world and participate in unique
//! indexes, so they are parsed once at the boundary and carried as a
//! `Name` afterwards. The type guarantees 3 to 40 characters drawn from
//! letters, digits, spaces, apostrophes and hyphens.

use crate::core::error::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9' -]{3,40}$").expect("valid name pattern"));

/// A validated entity name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Parse and validate a raw string into a `Name`.
    pub fn parse(value: &str) -> Result<Self, Error> {
        if !NAME_PATTERN.is_match(value) {
            return Err(Error::failed_precondition(
                "name",
                format!("invalid name {value:?}: expected 3-40 letters, digits, spaces, apostrophes or hyphens"),
            ));
        }
        Ok(Name(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::parse(&value)
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::parse(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_names() {
        for value in ["Tatooine", "Polysteel Copper Ore", "O'Brien-2", "abc"] {
            assert!(Name::parse(value).is_ok(), "should accept {value:?}");
        }
    }

    #[test]
    fn test_rejects_empty_and_short() {
        assert!(Name::parse("").is_err());
        assert!(Name::parse("ab").is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let long = "a".repeat(41);
        assert!(Name::parse(&long).is_err());
        let max = "a".repeat(40);
        assert!(Name::parse(&max).is_ok());
    }

    #[test]
    fn test_rejects_forbidden_characters() {
        assert!(Name::parse("semi;colon").is_err());
        assert!(Name::parse("tab\there").is_err());
        assert!(Name::parse("100%").is_err());
    }

    #[test]
    fn test_parse_failure_is_failed_precondition() {
        let err = Name::parse("!").unwrap_err();
        assert_eq!(err.error_code(), "FAILED_PRECONDITION");
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let ok: Result<Name, _> = serde_json::from_str("\"Kessel\"");
        assert!(ok.is_ok());
        let bad: Result<Name, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
