use std::sync::Arc;

use image::RgbImage;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    model::{ConfidenceThreshold, WeightsId},
};

/// A loaded detection network. Inference is read-only from the caller's view.
pub trait Detector: Send + Sync {
    fn weights(&self) -> &WeightsId;
    fn detect(&self, image: &RgbImage, threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>>;
}

/// Builds a detector for a weights identifier.
pub trait DetectorLoader: Send + Sync {
    fn load(&self, weights: &WeightsId) -> DomainResult<Arc<dyn Detector>>;
}

/// Draws detections on top of a copy of the source image.
pub trait Annotator: Send + Sync {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage;
}
