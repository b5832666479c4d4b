use crate::{MAX_KEY_NAME_LEN, MAX_MODEL_NAME_LEN};
use thiserror::Error as ThisError;

///
/// SchemaError
///
/// Raised while declaring keys; nothing is registered when one is returned.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("identifier is empty")]
    EmptyName,

    #[error("identifier '{0}' exceeds max length {MAX_KEY_NAME_LEN}")]
    KeyNameTooLong(String),

    #[error("model name '{0}' exceeds max length {MAX_MODEL_NAME_LEN}")]
    ModelNameTooLong(String),

    #[error("invalid length option on '{attribute}': {reason}")]
    InvalidLengthSpec { attribute: String, reason: String },
}

/// Ensure a key or association identifier is non-empty and bounded.
pub fn validate_key_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyName);
    }
    if name.len() > MAX_KEY_NAME_LEN {
        return Err(SchemaError::KeyNameTooLong(name.to_string()));
    }

    Ok(())
}

/// Ensure a model name is non-empty and bounded.
pub fn validate_model_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyName);
    }
    if name.len() > MAX_MODEL_NAME_LEN {
        return Err(SchemaError::ModelNameTooLong(name.to_string()));
    }

    Ok(())
}
