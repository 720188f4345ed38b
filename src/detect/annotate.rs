//! Drawing detections onto the source image.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};

use super::{DetectError, Detection};

/// Outline thickness in pixels.
const THICKNESS: u32 = 3;

const PALETTE: [[u8; 3]; 8] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 194, 255],
];

/// Colour used for a class across every annotated image.
pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Draw an outline for every detection. Boxes are clipped to the image.
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return canvas;
    }

    for detection in detections {
        let color = class_color(detection.class_id);
        let b = detection.bbox;
        let x1 = (b.x1.max(0.0) as u32).min(w - 1);
        let y1 = (b.y1.max(0.0) as u32).min(h - 1);
        let x2 = (b.x2.max(0.0) as u32).min(w - 1);
        let y2 = (b.y2.max(0.0) as u32).min(h - 1);
        if x2 < x1 || y2 < y1 {
            continue;
        }

        for t in 0..THICKNESS {
            for x in x1..=x2 {
                put(&mut canvas, x, y1 + t, y2, color);
                put(&mut canvas, x, y2.saturating_sub(t), y2, color);
            }
            for y in y1..=y2 {
                put(&mut canvas, (x1 + t).min(x2), y, y2, color);
                put(&mut canvas, x2.saturating_sub(t).max(x1), y, y2, color);
            }
        }
    }
    canvas
}

fn put(canvas: &mut RgbImage, x: u32, y: u32, max_y: u32, color: Rgb<u8>) {
    if y <= max_y && x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

/// Where the annotated copy of `source_name` goes for a given model label.
pub fn output_path(output_dir: &Path, source_name: &str, model_label: &str) -> PathBuf {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    output_dir.join(format!("{stem}-{model_label}.png"))
}

/// Save an annotated image as PNG, creating the directory if needed.
pub fn save(image: &RgbImage, path: &Path) -> Result<(), DetectError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DetectError::Annotate(e.to_string()))?;
    }
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DetectError::Annotate(e.to_string()))
}
