use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// The detector for a weights identifier could not be constructed.
    #[error("could not load model {weights}: {reason}")]
    Load { weights: String, reason: String },
    /// Inference failed for the current image.
    #[error("detection failed: {0}")]
    Detection(String),
    /// A setting outside its enumerated domain reached the core.
    #[error("invalid configuration: {0}")]
    ConfigurationViolation(String),
}

impl DomainError {
    pub fn load(weights: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load { weights: weights.into(), reason: reason.to_string() }
    }

    pub fn detection(reason: impl ToString) -> Self {
        Self::Detection(reason.to_string())
    }

    pub fn config(reason: impl ToString) -> Self {
        Self::ConfigurationViolation(reason.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
