//! Bulk request orchestration
//!
//! Bulk endpoints accept a list of externally-supplied payloads. Before
//! storage is touched at all, the whole batch is validated and converted
//! fail-fast: every item is checked independently, every failure is
//! recorded with its batch index, and a single aggregate error reports
//! them all. Only a batch that converts cleanly reaches the service's
//! bulk methods, whose persistence is all-or-nothing.

use crate::core::error::{BulkItemError, Error};

/// Maximum number of items allowed in one bulk operation.
pub const MAX_BATCH_SIZE: usize = 100;

/// Check that a batch size is within policy: not empty, at most
/// [`MAX_BATCH_SIZE`] items.
pub fn validate_batch_size(count: usize) -> Result<(), Error> {
    if count == 0 {
        return Err(Error::failed_precondition("items", "batch cannot be empty"));
    }
    if count > MAX_BATCH_SIZE {
        return Err(Error::failed_precondition(
            "items",
            format!("batch size exceeds maximum allowed: got {count}, max {MAX_BATCH_SIZE}"),
        ));
    }
    Ok(())
}

/// Convert a batch of raw payloads into typed domain inputs, collecting
/// every per-item failure instead of stopping at the first.
///
/// The batch size policy is checked before any per-item work. If any item
/// fails, the whole batch is rejected with [`Error::BulkValidation`]
/// listing each failing index, and the caller performs no storage call.
pub fn convert_batch<I, O, F>(items: Vec<I>, mut convert: F) -> Result<Vec<O>, Error>
where
    F: FnMut(usize, I) -> Result<O, BulkItemError>,
{
    validate_batch_size(items.len())?;

    let mut errors = Vec::new();
    let mut converted = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match convert(index, item) {
            Ok(output) => converted.push(output),
            Err(err) => errors.push(err),
        }
    }

    if !errors.is_empty() {
        return Err(Error::BulkValidation(errors));
    }

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_bounds() {
        assert!(validate_batch_size(0).is_err());
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(MAX_BATCH_SIZE).is_ok());
        assert!(validate_batch_size(MAX_BATCH_SIZE + 1).is_err());
    }

    #[test]
    fn test_batch_size_error_is_failed_precondition() {
        let err = validate_batch_size(101).unwrap_err();
        assert_eq!(err.error_code(), "FAILED_PRECONDITION");
    }

    #[test]
    fn test_clean_batch_converts_in_order() {
        let out = convert_batch(vec!["1", "2", "3"], |_, s| {
            s.parse::<i32>()
                .map_err(|e| BulkItemError::new(0, "item", e))
        })
        .unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_collects_every_failure() {
        let result = convert_batch(vec!["0", "x", "2", "y", "4"], |i, s| {
            s.parse::<i32>()
                .map_err(|e| BulkItemError::new(i, "item", e))
        });

        match result {
            Err(Error::BulkValidation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].index, 1);
                assert_eq!(errors[1].index, 3);
            }
            other => panic!("expected BulkValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch_rejected_before_conversion() {
        let mut called = false;
        let result = convert_batch(Vec::<&str>::new(), |i, _| {
            called = true;
            Ok::<_, BulkItemError>(i)
        });
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn test_oversized_batch_rejected_before_conversion() {
        let items: Vec<u32> = (0..101).collect();
        let mut calls = 0;
        let result = convert_batch(items, |_, v| {
            calls += 1;
            Ok::<_, BulkItemError>(v)
        });
        assert!(result.is_err());
        assert_eq!(calls, 0);
    }
}
