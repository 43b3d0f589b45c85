use std::io::Cursor;

use base64::{prelude::BASE64_STANDARD, Engine};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::{
    application::{pipeline::ACCEPTED_FORMATS, services::DetectionReport},
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        inventory::{self, NO_OBJECTS_WARNING},
        model::{ConfidenceThreshold, ModelTier, StrictnessBand},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierInfo {
    pub id: String,
    pub label: String,
    pub weights: String,
}

impl From<ModelTier> for TierInfo {
    fn from(tier: ModelTier) -> Self {
        Self {
            id: tier.id().to_string(),
            label: tier.label().to_string(),
            weights: tier.weights().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdInfo {
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub tiers: Vec<TierInfo>,
    pub default_tier: String,
    pub threshold: ThresholdInfo,
    pub accepted_formats: Vec<String>,
}

impl Default for ConfigResponse {
    fn default() -> Self {
        Self {
            tiers: ModelTier::ALL.into_iter().map(TierInfo::from).collect(),
            default_tier: ModelTier::default().id().to_string(),
            threshold: ThresholdInfo {
                default: ConfidenceThreshold::DEFAULT,
                min: ConfidenceThreshold::MIN,
                max: ConfidenceThreshold::MAX,
                step: ConfidenceThreshold::STEP,
            },
            accepted_formats: ACCEPTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrictnessQuery {
    pub threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrictnessResponse {
    pub band: StrictnessBand,
    pub message: String,
}

impl From<StrictnessBand> for StrictnessResponse {
    fn from(band: StrictnessBand) -> Self {
        Self { band, message: band.message().to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub model: String,
    pub weights: String,
    pub threshold: f32,
    pub strictness: StrictnessResponse,
    pub infer_ms: f32,
    /// Base64 PNG of the annotated image.
    pub annotated_png: String,
    pub detections: Vec<Detection>,
    pub inventory: Vec<InventoryEntry>,
    pub report_lines: Vec<String>,
    pub warning: Option<String>,
}

impl TryFrom<&DetectionReport> for DetectResponse {
    type Error = DomainError;

    fn try_from(report: &DetectionReport) -> DomainResult<Self> {
        let mut entries: Vec<InventoryEntry> = report
            .inventory
            .iter()
            .map(|(label, count)| InventoryEntry { label: label.clone(), count: *count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        Ok(Self {
            model: report.tier.label().to_string(),
            weights: report.weights.to_string(),
            threshold: report.threshold.value(),
            strictness: report.threshold.band().into(),
            infer_ms: report.infer_ms,
            annotated_png: encode_png_base64(&report.annotated)?,
            detections: report.detections.clone(),
            inventory: entries,
            report_lines: inventory::report_lines(&report.inventory),
            warning: report.is_empty().then(|| NO_OBJECTS_WARNING.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&DomainError> for ErrorResponse {
    fn from(e: &DomainError) -> Self {
        Self { error: format!("System Error: {e}") }
    }
}

pub fn encode_png_base64(image: &RgbImage) -> DomainResult<String> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| DomainError::detection(format!("could not encode annotated image: {e}")))?;
    Ok(BASE64_STANDARD.encode(buf.into_inner()))
}
