use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a comparison a record was on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRole {
    Needle,
    Candidate,
}

impl std::fmt::Display for RecordRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRole::Needle => write!(f, "needle"),
            RecordRole::Candidate => write!(f, "candidate"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Shape mismatch: needle is '{expected}', candidate #{position} is '{actual}'")]
    ShapeMismatch {
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("Missing field '{field}' in {role} record of shape '{shape}'")]
    MissingField {
        field: String,
        role: RecordRole,
        shape: String,
    },

    #[error("Invalid input for {strategy} strategy: {reason}")]
    InvalidInput {
        strategy: &'static str,
        reason: String,
    },

    #[error("Scan cancelled after {scanned} candidates")]
    Cancelled { scanned: usize },

    #[error("Record source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_input(strategy: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            strategy,
            reason: reason.into(),
        }
    }
}

/// Construction-time configuration errors. Never raised while scanning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Field '{field}' has weight {weight} outside [{min}, {max}]")]
    WeightOutOfBounds {
        field: String,
        weight: f64,
        min: f64,
        max: f64,
    },

    #[error("Field '{field}' has invalid weight bounds [{min}, {max}]")]
    InvalidWeightBounds { field: String, min: f64, max: f64 },

    #[error("Radius {from}-{to} km has {name} {value} outside [0, 1]")]
    RatioOutOfBounds {
        from: f64,
        to: f64,
        name: &'static str,
        value: f64,
    },

    #[error("Radius {from}-{to} km is empty or inverted")]
    InvalidRadius { from: f64, to: f64 },

    #[error("Far ratio {0} outside [0, 1]")]
    FarRatioOutOfBounds(f64),

    #[error("Text strategy needs at least one algorithm")]
    EmptyAlgorithmSet,

    #[error("Unknown text algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("Threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("Malformed match configuration: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_field() {
        let err = Error::MissingField {
            field: "Place".to_string(),
            role: RecordRole::Candidate,
            shape: "place".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing field 'Place' in candidate record of shape 'place'"
        );
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::EmptyAlgorithmSet.into();
        assert!(matches!(err, Error::Config(ConfigError::EmptyAlgorithmSet)));
    }
}
