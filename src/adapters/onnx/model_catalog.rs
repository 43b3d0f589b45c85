use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::{Detector, DetectorLoader};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{WeightsId, YoloParams};

/// Finds `<models_dir>/<weights>.onnx` and builds an engine from it.
pub struct OnnxModelCatalog {
    models_dir: PathBuf,
    params: YoloParams,
    intra_threads: usize,
}

impl OnnxModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>, params: YoloParams, intra_threads: usize) -> Self {
        Self { models_dir: models_dir.into(), params, intra_threads }
    }

    pub fn model_path(&self, weights: &WeightsId) -> PathBuf {
        self.models_dir.join(format!("{}.onnx", weights.as_str()))
    }

    pub fn validate_model(&self, weights: &WeightsId) -> DomainResult<PathBuf> {
        let path = self.model_path(weights);
        if !Path::new(&path).is_file() {
            return Err(DomainError::load(
                weights.as_str(),
                format!("model file not found: {}", path.display()),
            ));
        }
        Ok(path)
    }
}

impl DetectorLoader for OnnxModelCatalog {
    fn load(&self, weights: &WeightsId) -> DomainResult<Arc<dyn Detector>> {
        let path = self.validate_model(weights)?;
        let engine = OnnxYoloEngine::load(weights.clone(), &path, self.params.clone(), self.intra_threads)
            .map_err(|e| DomainError::load(weights.as_str(), format!("{e:#}")))?;
        info!(weights = %weights, path = %path.display(), "model ready");
        Ok(Arc::new(engine))
    }
}
