use crate::errors::{AppError, AppResult};

/// Only the owning user may act on an attempt. The error says nothing about
/// the attempt itself.
pub fn require_owner(caller_id: &str, resource_owner: &str) -> AppResult<()> {
    if caller_id != resource_owner {
        return Err(AppError::AccessDenied);
    }
    Ok(())
}
