#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types for tests
pub use elevate_vision::application::{
    model_provider::{DetectorCache, ModelProvider},
    ports::{Annotator, Detector, DetectorLoader},
    services::DetectionService,
};
pub use elevate_vision::domain::{
    detection::{BoundingBox, Detection},
    errors::{DomainError, DomainResult},
    model::{ConfidenceThreshold, ModelTier, Settings, WeightsId},
};
