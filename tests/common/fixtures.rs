use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use elevate_vision::adapters::render::annotator::BoxAnnotator;
use elevate_vision::application::{
    model_provider::{DetectorCache, ModelProvider},
    ports::{Annotator, Detector, DetectorLoader},
    services::DetectionService,
};
use elevate_vision::domain::{
    detection::{BoundingBox, Detection},
    errors::{DomainError, DomainResult},
    model::{ConfidenceThreshold, WeightsId},
};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

/// Returns the same canned detections for every image, whatever the threshold.
pub struct FakeDetector {
    pub weights: WeightsId,
    pub detections: Vec<Detection>,
    pub calls: AtomicUsize,
}

impl Detector for FakeDetector {
    fn weights(&self) -> &WeightsId {
        &self.weights
    }

    fn detect(&self, _image: &RgbImage, _threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}

/// A detector whose inference always fails.
pub struct BrokenDetector {
    pub weights: WeightsId,
}

impl Detector for BrokenDetector {
    fn weights(&self) -> &WeightsId {
        &self.weights
    }

    fn detect(&self, _image: &RgbImage, _threshold: ConfidenceThreshold) -> DomainResult<Vec<Detection>> {
        Err(DomainError::detection("invalid detector state"))
    }
}

/// Loader that counts constructions and can be told to fail.
pub struct FakeLoader {
    pub detections: Vec<Detection>,
    pub loads: AtomicUsize,
    pub loaded: Mutex<Vec<WeightsId>>,
    pub fail: bool,
    pub broken: bool,
    pub panic_next: AtomicBool,
}

impl FakeLoader {
    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            loads: AtomicUsize::new(0),
            loaded: Mutex::new(Vec::new()),
            fail: false,
            broken: false,
            panic_next: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::with_detections(Vec::new()) }
    }

    pub fn broken() -> Self {
        Self { broken: true, ..Self::with_detections(Vec::new()) }
    }

    /// Panics on the first load, behaves normally afterwards.
    pub fn panicking_once() -> Self {
        Self { panic_next: AtomicBool::new(true), ..Self::with_detections(Vec::new()) }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DetectorLoader for FakeLoader {
    fn load(&self, weights: &WeightsId) -> DomainResult<Arc<dyn Detector>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("weights runtime crashed while loading {weights}");
        }
        if self.fail {
            return Err(DomainError::load(weights.as_str(), "model file not found"));
        }
        self.loaded.lock().unwrap().push(weights.clone());
        if self.broken {
            return Ok(Arc::new(BrokenDetector { weights: weights.clone() }));
        }
        Ok(Arc::new(FakeDetector {
            weights: weights.clone(),
            detections: self.detections.clone(),
            calls: AtomicUsize::new(0),
        }))
    }
}

pub fn det(label: &str, class_id: usize, score: f32, x: f32) -> Detection {
    Detection {
        class_id,
        label: label.to_string(),
        score,
        bbox: BoundingBox { x1: x, y1: 10.0, x2: x + 20.0, y2: 40.0 },
    }
}

/// Street scene: two people, a car, a low-confidence dog.
pub fn street_scene() -> Vec<Detection> {
    vec![
        det("person", 0, 0.91, 5.0),
        det("person", 0, 0.62, 30.0),
        det("car", 2, 0.80, 60.0),
        det("dog", 16, 0.35, 90.0),
    ]
}

pub fn provider_with(loader: Arc<FakeLoader>) -> ModelProvider {
    ModelProvider::new(loader, Arc::new(DetectorCache::new()))
}

pub fn service_with(loader: Arc<FakeLoader>) -> DetectionService {
    let annotator: Arc<dyn Annotator> = Arc::new(BoxAnnotator::without_font());
    DetectionService::new(provider_with(loader), annotator)
}

pub fn test_image() -> RgbImage {
    ImageBuffer::from_fn(120, 80, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 128u8]))
}

pub fn encoded(format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    test_image().write_to(&mut buf, format).expect("Failed to encode test image");
    buf.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    encoded(ImageFormat::Png)
}

pub fn jpeg_bytes() -> Vec<u8> {
    encoded(ImageFormat::Jpeg)
}

pub fn threshold(v: f32) -> ConfidenceThreshold {
    ConfidenceThreshold::new(v).expect("valid threshold")
}

pub const BOUNDARY: &str = "elevate-vision-test-boundary";

/// Builds a multipart/form-data body from text fields and an optional image.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"image\"; filename=\"upload.png\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
