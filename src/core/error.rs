//! Typed error handling for the business core
//!
//! Every failure that crosses the business boundary is classified into one
//! of four kinds, so callers can react without string matching:
//!
//! - `NotFound`: a lookup by key or natural name matched zero rows
//! - `Aborted`: storage rejected a uniqueness invariant (duplicate name/key)
//! - `FailedPrecondition`: malformed input or a failed local invariant,
//!   always detected before any storage access (includes aggregated
//!   per-item bulk validation errors)
//! - `Internal`: any other storage or infrastructure failure
//!
//! Raw storage errors never cross into this layer unclassified; the
//! service wraps them with the failing operation before conversion.

use serde::Serialize;
use std::fmt;

/// The main error type exposed by the business core.
#[derive(Debug)]
pub enum Error {
    /// A lookup matched zero rows.
    NotFound { entity: &'static str, key: String },

    /// Storage rejected a uniqueness invariant.
    Aborted { entity: &'static str, message: String },

    /// Input validation failed before any storage access.
    FailedPrecondition { field: String, message: String },

    /// One or more items of a bulk request failed validation.
    ///
    /// Carries every failing item, not just the first; storage is never
    /// touched when this is returned.
    BulkValidation(Vec<BulkItemError>),

    /// Unexpected storage or infrastructure failure.
    Internal { operation: String, message: String },
}

/// A single item failure inside a bulk request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkItemError {
    /// Zero-based index into the submitted batch.
    pub index: usize,
    /// The field (or "item" for whole-payload failures) that failed.
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

impl BulkItemError {
    pub fn new(index: usize, field: &str, message: impl fmt::Display) -> Self {
        Self {
            index,
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for BulkItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item[{}].{}: {}", self.index, self.field, self.message)
    }
}

impl Error {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn aborted(entity: &'static str, message: impl fmt::Display) -> Self {
        Error::Aborted {
            entity,
            message: message.to_string(),
        }
    }

    pub fn failed_precondition(field: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::FailedPrecondition {
            field: field.into(),
            message: message.to_string(),
        }
    }

    pub fn internal(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Internal {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Aborted { .. } => "ABORTED",
            Error::FailedPrecondition { .. } => "FAILED_PRECONDITION",
            Error::BulkValidation(_) => "FAILED_PRECONDITION",
            Error::Internal { .. } => "INTERNAL",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted { .. })
    }

    pub fn is_failed_precondition(&self) -> bool {
        matches!(
            self,
            Error::FailedPrecondition { .. } | Error::BulkValidation(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { entity, key } => {
                write!(f, "{} with key '{}' not found", entity, key)
            }
            Error::Aborted { entity, message } => {
                write!(f, "{}: {}", entity, message)
            }
            Error::FailedPrecondition { field, message } => {
                write!(f, "validation failed for '{}': {}", field, message)
            }
            Error::BulkValidation(errors) => {
                let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "bulk validation failed: {}", msgs.join(", "))
            }
            Error::Internal { operation, message } => {
                write!(f, "{}: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<validator::ValidationErrors> for Error {
    fn from(errs: validator::ValidationErrors) -> Self {
        // Surface the first offending field; the full set is in the message.
        let field = errs
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "item".to_string());
        Error::FailedPrecondition {
            field,
            message: errs.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("galaxy", "b5c3");
        assert!(err.to_string().contains("galaxy"));
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_aborted_code() {
        let err = Error::aborted("user", "email is not unique");
        assert_eq!(err.error_code(), "ABORTED");
        assert!(err.is_aborted());
    }

    #[test]
    fn test_bulk_validation_lists_every_item() {
        let err = Error::BulkValidation(vec![
            BulkItemError::new(1, "item", "name is required"),
            BulkItemError::new(3, "id", "invalid UUID"),
        ]);
        let display = err.to_string();
        assert!(display.contains("item[1]"));
        assert!(display.contains("item[3]"));
        assert_eq!(err.error_code(), "FAILED_PRECONDITION");
        assert!(err.is_failed_precondition());
    }

    #[test]
    fn test_bulk_item_error_serializes() {
        let item = BulkItemError::new(0, "name", "too short");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["index"], 0);
        assert_eq!(json["field"], "name");
    }
}
