use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::Annotator;
use crate::domain::detection::Detection;

// Ultralytics default palette.
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38], [0xFF, 0x9D, 0x97], [0xFF, 0x70, 0x1F], [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31], [0x48, 0xF9, 0x0A], [0x92, 0xCC, 0x17], [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34], [0x00, 0xD4, 0xBB], [0x2C, 0x99, 0xA8], [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93], [0x64, 0x73, 0xFF], [0x00, 0x18, 0xEC], [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85], [0xCB, 0x38, 0xFF], [0xFF, 0x95, 0xC8], [0xFF, 0x37, 0xC7],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Draws class-coloured boxes with a "<label> <score>" tab above each one.
pub struct BoxAnnotator {
    font: Option<FontVec>,
}

impl BoxAnnotator {
    /// Boxes and tabs only, no label text.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn with_font_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|_| anyhow::anyhow!("{} is not a valid TrueType/OpenType font", path.display()))?;
        Ok(Self { font: Some(font) })
    }
}

impl Annotator for BoxAnnotator {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.clone();
        let (w, h) = canvas.dimensions();
        let thickness = ((w.max(h) as f32 / 400.0).round() as i32).max(1);
        let scale = PxScale::from((w.max(h) as f32 / 45.0).clamp(12.0, 36.0));

        for det in detections {
            let color = class_color(det.class_id);
            let x1 = det.bbox.x1.round() as i32;
            let y1 = det.bbox.y1.round() as i32;
            let bw = det.bbox.width().round().max(1.0) as u32;
            let bh = det.bbox.height().round().max(1.0) as u32;

            for t in 0..thickness {
                let inset = t as u32 * 2;
                if bw <= inset || bh <= inset {
                    break;
                }
                let rect = Rect::at(x1 + t, y1 + t).of_size(bw - inset, bh - inset);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            let caption = format!("{} {:.2}", det.label, det.score);
            let (tw, th) = match &self.font {
                Some(font) => text_size(scale, font, &caption),
                None => ((scale.x * 0.5 * caption.len() as f32) as u32, scale.y as u32),
            };
            let tab_h = th + 4;
            // tab sits above the box, or inside it when the box touches the top edge
            let tab_y = if y1 >= tab_h as i32 { y1 - tab_h as i32 } else { y1 };
            draw_filled_rect_mut(&mut canvas, Rect::at(x1, tab_y).of_size(tw + 4, tab_h), color);

            if let Some(font) = &self.font {
                draw_text_mut(&mut canvas, Rgb([255, 255, 255]), x1 + 2, tab_y + 2, scale, font, &caption);
            }
        }
        canvas
    }
}
