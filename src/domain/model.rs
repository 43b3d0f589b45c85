use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Model size offered to the user. Bigger tiers trade speed for accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Nano,
    #[default]
    Medium,
    Large,
}

impl ModelTier {
    pub const ALL: [ModelTier; 3] = [ModelTier::Nano, ModelTier::Medium, ModelTier::Large];

    pub fn weights(self) -> WeightsId {
        let name = match self {
            ModelTier::Nano => "yolov8n",
            ModelTier::Medium => "yolov8m",
            ModelTier::Large => "yolov8l",
        };
        WeightsId(name.to_string())
    }

    pub fn id(self) -> &'static str {
        match self {
            ModelTier::Nano => "nano",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelTier::Nano => "Nano (Fast & Lightweight)",
            ModelTier::Medium => "Medium (Balanced)",
            ModelTier::Large => "Large (High Accuracy)",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelTier {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nano" => Ok(ModelTier::Nano),
            "medium" => Ok(ModelTier::Medium),
            "large" => Ok(ModelTier::Large),
            other => Err(DomainError::config(format!(
                "unknown model tier '{other}' (expected nano, medium or large)"
            ))),
        }
    }
}

/// Identifier of a set of pre-trained weights, e.g. "yolov8m".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightsId(pub String);

impl WeightsId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeightsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimum score a detection needs to be reported. Always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct ConfidenceThreshold(f32);

impl ConfidenceThreshold {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;
    pub const STEP: f32 = 0.05;
    pub const DEFAULT: f32 = 0.45;

    pub fn new(value: f32) -> DomainResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::config(format!(
                "confidence threshold {value} outside [{}, {}]",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn band(self) -> StrictnessBand {
        StrictnessBand::for_threshold(self.0)
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f32> for ConfidenceThreshold {
    type Error = DomainError;

    fn try_from(value: f32) -> DomainResult<Self> {
        Self::new(value)
    }
}

/// Hint shown next to the strictness slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessBand {
    Loose,
    Balanced,
    Strict,
}

impl StrictnessBand {
    pub fn for_threshold(value: f32) -> Self {
        if value < 0.3 {
            StrictnessBand::Loose
        } else if value > 0.7 {
            StrictnessBand::Strict
        } else {
            StrictnessBand::Balanced
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            StrictnessBand::Loose => "Loose: Might see false objects.",
            StrictnessBand::Balanced => "Balanced",
            StrictnessBand::Strict => "Strict: Might miss small objects.",
        }
    }
}

/// Parameters of the YOLO decoder that are not user-facing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoloParams {
    pub input_size: u32,        // 640 typical
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,  // e.g. 300
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

/// Settings captured for one run.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub model_tier: ModelTier,
    pub confidence_threshold: ConfidenceThreshold,
    pub source_image: Option<Vec<u8>>,
}
