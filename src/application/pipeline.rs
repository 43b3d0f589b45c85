use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::debug;

use crate::application::ports::{Annotator, Detector};
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::ConfidenceThreshold,
};

pub const ACCEPTED_FORMATS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Result of one inference run.
#[derive(Debug, Clone)]
pub struct DetectionOutput {
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
}

/// Decodes uploaded bytes. Only JPEG and PNG are accepted.
pub fn decode_upload(bytes: &[u8]) -> DomainResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(DomainError::detection("uploaded file is empty"));
    }
    let format = image::guess_format(bytes)
        .map_err(|e| DomainError::detection(format!("unreadable image: {e}")))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(DomainError::detection(format!(
            "unsupported image format {format:?} (expected jpeg or png)"
        )));
    }
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DomainError::detection(format!("unreadable image: {e}")))
}

pub fn detect(
    detector: &dyn Detector,
    annotator: &dyn Annotator,
    image: &DynamicImage,
    threshold: ConfidenceThreshold,
) -> DomainResult<DetectionOutput> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DomainError::detection("image has empty dimensions"));
    }
    let rgb = image.to_rgb8();

    let mut detections = detector.detect(&rgb, threshold)?;
    detections.retain(|d| d.score >= threshold.value());

    debug!(
        weights = %detector.weights(),
        threshold = threshold.value(),
        count = detections.len(),
        "inference finished"
    );

    let annotated = annotator.annotate(&rgb, &detections);
    Ok(DetectionOutput { annotated, detections })
}
