//! Error types for subject event publishing and consumption

use thiserror::Error;

/// Subject event bus errors
#[derive(Error, Debug)]
pub enum SubjectEventError {
    /// Redis connection or operation error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Event serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid event payload received
    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SubjectEventError::InvalidPayload("missing subject_id".to_string());
        assert_eq!(err.to_string(), "Invalid event payload: missing subject_id");
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: SubjectEventError = json_err.into();
        assert!(matches!(err, SubjectEventError::Serialization(_)));
    }
}
