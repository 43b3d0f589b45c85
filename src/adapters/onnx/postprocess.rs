use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{s, Array4, ArrayView2};

use crate::adapters::onnx::classes::class_name;
use crate::domain::detection::{BoundingBox, Detection};

const PAD_VALUE: u8 = 114;

/// How the source image was fitted into the square network input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl Letterbox {
    pub fn fit(orig_w: u32, orig_h: u32, size: u32) -> Self {
        let scale = (size as f32 / orig_w as f32).min(size as f32 / orig_h as f32);
        let new_w = (orig_w as f32 * scale).round();
        let new_h = (orig_h as f32 * scale).round();
        Self {
            scale,
            pad_x: ((size as f32 - new_w) / 2.0).floor(),
            pad_y: ((size as f32 - new_h) / 2.0).floor(),
            orig_w,
            orig_h,
        }
    }

    /// Maps a center-format box in network space back to original pixels.
    pub fn restore(&self, cx: f32, cy: f32, w: f32, h: f32) -> BoundingBox {
        let max_x = self.orig_w as f32;
        let max_y = self.orig_h as f32;
        BoundingBox {
            x1: ((cx - w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x),
            y1: ((cy - h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y),
            x2: ((cx + w / 2.0 - self.pad_x) / self.scale).clamp(0.0, max_x),
            y2: ((cy + h / 2.0 - self.pad_y) / self.scale).clamp(0.0, max_y),
        }
    }
}

/// Letterboxes `rgb` to `size`x`size` and returns the NCHW tensor in [0, 1].
pub fn preprocess(rgb: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let lb = Letterbox::fit(rgb.width(), rgb.height(), size);
    let new_w = ((rgb.width() as f32 * lb.scale).round() as u32).clamp(1, size);
    let new_h = ((rgb.height() as f32 * lb.scale).round() as u32).clamp(1, size);
    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    image::imageops::overlay(&mut canvas, &resized, lb.pad_x as i64, lb.pad_y as i64);

    let s = size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, s, s));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    (input, lb)
}

/// Decodes a `[4 + classes, anchors]` YOLOv8 head. Keeps candidates whose best
/// class score is at least `threshold`.
pub fn decode(view: ArrayView2<f32>, lb: &Letterbox, threshold: f32) -> Vec<Detection> {
    let mut out = Vec::new();
    if view.shape()[0] <= 4 {
        return out;
    }

    for i in 0..view.shape()[1] {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, &score)) = scores
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };
        if !score.is_finite() || score < threshold {
            continue;
        }

        let (cx, cy, w, h) = (view[[0, i]], view[[1, i]], view[[2, i]], view[[3, i]]);
        if w <= 0.0 || h <= 0.0 {
            continue;
        }
        let bbox = lb.restore(cx, cy, w, h);
        if bbox.area() <= 0.0 {
            continue;
        }

        out.push(Detection { class_id, label: class_name(class_id), score, bbox });
    }
    out
}

/// Per-class greedy NMS. Output is sorted by score and capped at `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len().min(max_detections));
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.bbox.iou(&cand.bbox) > iou_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }
    kept
}
