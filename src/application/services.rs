use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tracing::{info, warn};

use crate::{
    application::{
        model_provider::ModelProvider,
        pipeline::{self, DetectionOutput},
        ports::Annotator,
    },
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        inventory::{self, Inventory},
        model::{ConfidenceThreshold, ModelTier, Settings, WeightsId},
    },
};

/// Everything the page needs after a successful run.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub tier: ModelTier,
    pub weights: WeightsId,
    pub threshold: ConfidenceThreshold,
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
    pub inventory: Inventory,
    pub infer_ms: f32,
}

impl DetectionReport {
    /// True when nothing cleared the threshold. This is a warning, not a failure.
    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty()
    }
}

/// Orchestrates provider, pipeline and summarizer for one upload.
#[derive(Clone)]
pub struct DetectionService {
    provider: ModelProvider,
    annotator: Arc<dyn Annotator>,
}

impl DetectionService {
    pub fn new(provider: ModelProvider, annotator: Arc<dyn Annotator>) -> Self {
        Self { provider, annotator }
    }

    pub fn run(&self, settings: &Settings) -> DomainResult<DetectionReport> {
        let Some(bytes) = settings.source_image.as_deref() else {
            return Err(DomainError::config("no image uploaded"));
        };

        let detector = self.provider.get_detector(settings.model_tier)?;
        let image = pipeline::decode_upload(bytes).map_err(|e| {
            warn!("rejected upload: {e}");
            e
        })?;

        let started = Instant::now();
        let DetectionOutput { annotated, detections } = pipeline::detect(
            detector.as_ref(),
            self.annotator.as_ref(),
            &image,
            settings.confidence_threshold,
        )?;
        let infer_ms = started.elapsed().as_secs_f32() * 1000.0;

        let inventory = inventory::summarize(&detections);
        info!(
            tier = %settings.model_tier,
            threshold = settings.confidence_threshold.value(),
            detections = detections.len(),
            classes = inventory.len(),
            infer_ms,
            "analysis complete"
        );

        Ok(DetectionReport {
            tier: settings.model_tier,
            weights: detector.weights().clone(),
            threshold: settings.confidence_threshold,
            annotated,
            detections,
            inventory,
            infer_ms,
        })
    }
}
