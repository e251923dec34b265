use crate::error::{CoreError, Result};

/// Generates a new record identifier (UUID v4, hyphenated lowercase).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Rejects identifiers that cannot be used as a storage key segment.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 {
        return Err(CoreError::invalid_id(id));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::invalid_id(id));
    }
    Ok(())
}
