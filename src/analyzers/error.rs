use thiserror::Error;

/// A raw log entry or vehicle field that cannot be turned into typed input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample {index}: field `{field}` {reason}")]
    Sample {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("field `{field}` {reason}")]
    Log { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn sample(index: usize, field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Sample {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn log(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Log {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Index of the offending sample, `None` for vehicle or top-level fields.
    pub fn index(&self) -> Option<usize> {
        match self {
            ValidationError::Sample { index, .. } => Some(*index),
            ValidationError::Log { .. } => None,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::Sample { field, .. } | ValidationError::Log { field, .. } => field,
        }
    }
}

/// Anything that stops raw bytes from becoming a [`Report`](super::types::Report).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("log is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid log: {0}")]
    Validation(#[from] ValidationError),
}

impl AnalysisError {
    /// Short machine-readable label, used as the `error_type` of summary rows.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Parse(_) => "parse_error",
            AnalysisError::Validation(_) => "validation_error",
        }
    }
}
