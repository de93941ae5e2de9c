//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID read from a TEXT column
///
/// A malformed value means the row was written by something other than
/// this workspace and is reported as an internal error.
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("malformed id '{}': {}", s, e)))
}

/// Parse an optional UUID column
pub fn parse_opt(s: Option<String>) -> Result<Option<Uuid>> {
    s.as_deref().map(parse).transpose()
}
