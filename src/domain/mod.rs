//! Concrete domain instantiations of the generic core
//!
//! Each module here contributes only data to the generic machinery: a
//! table spec, a sort-key allow-list, a filter struct, the lifecycle
//! rules for its `New`/`Update` payloads, and the request types the
//! bulk orchestrator converts from.

pub mod galaxy;
pub mod resource;
pub mod resource_group;
pub mod resource_type;
pub mod user;

use crate::core::error::Error;
use uuid::Uuid;

/// Parse a wire-format UUID, attributing the failure to `field`.
pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|err| Error::failed_precondition(field, err))
}
