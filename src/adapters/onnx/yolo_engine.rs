use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;

use crate::adapters::onnx::postprocess::{decode, non_max_suppression, preprocess};
use crate::application::ports::Detector;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{ConfidenceThreshold, WeightsId, YoloParams},
};

/// YOLOv8 detector backed by an ONNX Runtime session.
pub struct OnnxYoloEngine {
    weights: WeightsId,
    params: YoloParams,
    // `Session::run` needs `&mut`, so concurrent callers take turns.
    session: Mutex<Session>,
}

impl OnnxYoloEngine {
    pub fn load(weights: WeightsId, path: &Path, params: YoloParams, intra_threads: usize) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(intra_threads)?;

        // CUDA is optional: registered when available, CPU otherwise.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { weights, params, session: Mutex::new(session) })
    }

    fn infer(&self, rgb: &RgbImage, threshold: f32) -> Result<Vec<Detection>> {
        let (input, letterbox) = preprocess(rgb, self.params.input_size);

        let input_shape = input.shape().iter().map(|&d| d as i64).collect::<Vec<_>>();
        let (raw, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, raw))?;

        // a panic mid-run leaves no partial state in the session
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        if dims.len() != 3 {
            return Err(anyhow!("unexpected output shape {dims:?}"));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let candidates = decode(view, &letterbox, threshold);
        Ok(non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        ))
    }
}

impl Detector for OnnxYoloEngine {
    fn weights(&self) -> &WeightsId {
        &self.weights
    }

    fn detect(&self, image: &RgbImage, threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>> {
        self.infer(image, threshold.value())
            .map_err(|e| DomainError::detection(format!("{}: {e:#}", self.weights)))
    }
}
