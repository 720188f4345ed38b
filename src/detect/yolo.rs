//! YOLO pre- and post-processing: letterboxing, tensor layout, and decoding
//! of the two ONNX export layouts.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix3};

use super::{BoundingBox, DetectError, Detection};

/// Square input edge expected by the exported models.
pub const INPUT_SIZE: u32 = 640;

/// Padding colour used by Ultralytics letterboxing.
const PAD_VALUE: u8 = 114;

/// IoU above which a lower-scored box of the same class is suppressed.
pub const NMS_IOU_THRESHOLD: f32 = 0.7;

/// Upper bound on boxes returned per image.
pub const MAX_DETECTIONS: usize = 300;

/// How a source image was scaled and padded into the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    pub fn new(source_width: u32, source_height: u32) -> Self {
        let w = source_width.max(1);
        let h = source_height.max(1);
        let scale = (INPUT_SIZE as f32 / w as f32).min(INPUT_SIZE as f32 / h as f32);
        let (new_w, new_h) = scaled_size(w, h, scale);
        Self {
            scale,
            pad_x: (INPUT_SIZE - new_w) / 2,
            pad_y: (INPUT_SIZE - new_h) / 2,
            source_width: w,
            source_height: h,
        }
    }

    /// Map a box in model-input space back to source-image pixels.
    pub fn to_source(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        let max_x = self.source_width as f32;
        let max_y = self.source_height as f32;
        let unmap = |v: f32, pad: u32, max: f32| ((v - pad as f32) / self.scale).clamp(0.0, max);
        BoundingBox {
            x1: unmap(x1, self.pad_x, max_x),
            y1: unmap(y1, self.pad_y, max_y),
            x2: unmap(x2, self.pad_x, max_x),
            y2: unmap(y2, self.pad_y, max_y),
        }
    }
}

fn scaled_size(w: u32, h: u32, scale: f32) -> (u32, u32) {
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, INPUT_SIZE);
    (new_w, new_h)
}

/// Letterbox `image` into a `[1, 3, 640, 640]` RGB tensor scaled to `[0, 1]`.
pub fn preprocess(image: &DynamicImage) -> (Array4<f32>, Letterbox) {
    let (w, h) = image.dimensions();
    let letterbox = Letterbox::new(w, h);
    let (new_w, new_h) = scaled_size(letterbox.source_width, letterbox.source_height, letterbox.scale);

    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();
    let mut canvas = RgbImage::from_pixel(INPUT_SIZE, INPUT_SIZE, Rgb([PAD_VALUE; 3]));
    imageops::overlay(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );

    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, letterbox)
}

/// Decode raw model output into detections in source-image pixels, sorted
/// by descending confidence.
///
/// Two layouts are understood:
/// - end-to-end `[1, N, 6]` rows of `(x1, y1, x2, y2, score, class)`, already
///   de-duplicated by the model (YOLOv10);
/// - anchor grid `[1, 4 + classes, anchors]` columns of
///   `(cx, cy, w, h, score per class)`, which need NMS (YOLOv11/12).
pub fn decode(
    output: ArrayViewD<'_, f32>,
    confidence: f32,
    letterbox: &Letterbox,
) -> Result<Vec<Detection>, DetectError> {
    let shape = output.shape().to_vec();
    let output = output
        .into_dimensionality::<Ix3>()
        .ok()
        .filter(|o| o.shape()[0] == 1)
        .ok_or_else(|| DetectError::Inference(format!("unexpected output shape {shape:?}")))?;
    let output = output.index_axis_move(Axis(0), 0);

    if shape[2] == 6 {
        let mut detections: Vec<Detection> = output
            .outer_iter()
            .filter(|row| row[4] >= confidence)
            .map(|row| Detection {
                class_id: row[5].max(0.0) as usize,
                confidence: row[4],
                bbox: letterbox.to_source(row[0], row[1], row[2], row[3]),
            })
            .collect();
        sort_by_confidence(&mut detections);
        detections.truncate(MAX_DETECTIONS);
        return Ok(detections);
    }

    let channels = shape[1];
    if channels <= 4 {
        return Err(DetectError::Inference(format!(
            "output has no class scores: {shape:?}"
        )));
    }

    let mut candidates = Vec::new();
    for anchor in output.axis_iter(Axis(1)) {
        let (class_id, score) = anchor
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });
        if score < confidence {
            continue;
        }
        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        candidates.push(Detection {
            class_id,
            confidence: score,
            bbox: letterbox.to_source(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0),
        });
    }

    Ok(non_max_suppression(candidates, NMS_IOU_THRESHOLD, MAX_DETECTIONS))
}

/// Greedy class-aware NMS. Output is sorted by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    sort_by_confidence(&mut candidates);
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() == max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn identity() -> Letterbox {
        Letterbox::new(INPUT_SIZE, INPUT_SIZE)
    }

    fn det(class_id: usize, confidence: f32, x1: f32, x2: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BoundingBox {
                x1,
                y1: 0.0,
                x2,
                y2: 10.0,
            },
        }
    }

    #[test]
    fn letterbox_wide_image_pads_vertically() {
        let lb = Letterbox::new(1280, 640);
        assert!((lb.scale - 0.5).abs() < 1e-6);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn letterbox_maps_back_to_source() {
        let lb = Letterbox::new(1280, 640);
        let b = lb.to_source(100.0, 260.0, 200.0, 360.0);
        assert_eq!(b.x1, 200.0);
        assert_eq!(b.y1, 200.0);
        assert_eq!(b.x2, 400.0);
        assert_eq!(b.y2, 400.0);
    }

    #[test]
    fn letterbox_clamps_to_image() {
        let lb = Letterbox::new(1280, 640);
        let b = lb.to_source(-10.0, 0.0, 700.0, 640.0);
        assert_eq!(b.x1, 0.0);
        assert_eq!(b.y1, 0.0);
        assert_eq!(b.x2, 1280.0);
        assert_eq!(b.y2, 640.0);
    }

    #[test]
    fn preprocess_shape_and_padding() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([255, 0, 0])));
        let (tensor, lb) = preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_eq!(lb.pad_y, 160);
        // Padding row is gray, centre is red.
        assert!((tensor[[0, 0, 0, 0]] - 114.0 / 255.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 320, 320]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 320, 320]].abs() < 1e-6);
    }

    #[test]
    fn decode_end_to_end_filters_by_confidence() {
        let mut raw = Array3::<f32>::zeros((1, 3, 6));
        let rows = [
            [10.0, 10.0, 50.0, 50.0, 0.5021, 2.0],
            [60.0, 60.0, 90.0, 90.0, 0.10, 0.0],
            [0.0, 0.0, 20.0, 20.0, 0.8734, 1.0],
        ];
        for (i, row) in rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                raw[[0, i, j]] = *v;
            }
        }
        let detections = decode(raw.view().into_dyn(), 0.3, &identity()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_id, 1);
        assert_eq!(detections[1].class_id, 2);
        assert_eq!(detections[1].bbox.x2, 50.0);
    }

    #[test]
    fn decode_anchor_grid_picks_best_class_and_suppresses_overlap() {
        // 4 box channels + 3 classes, 3 anchors.
        let mut raw = Array3::<f32>::zeros((1, 7, 3));
        let anchors = [
            [100.0, 100.0, 40.0, 40.0, 0.1, 0.9, 0.2],
            [101.0, 100.0, 40.0, 40.0, 0.1, 0.8, 0.2],
            [300.0, 300.0, 20.0, 20.0, 0.6, 0.1, 0.1],
        ];
        for (a, values) in anchors.iter().enumerate() {
            for (c, v) in values.iter().enumerate() {
                raw[[0, c, a]] = *v;
            }
        }
        let detections = decode(raw.view().into_dyn(), 0.3, &identity()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_id, 1);
        assert!((detections[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(detections[0].bbox.x1, 80.0);
        assert_eq!(detections[1].class_id, 0);
    }

    #[test]
    fn decode_empty_output_is_ok() {
        let raw = Array3::<f32>::zeros((1, 7, 0));
        let detections = decode(raw.view().into_dyn(), 0.3, &identity()).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn decode_rejects_bad_shape() {
        let raw = ndarray::Array2::<f32>::zeros((4, 4));
        assert!(matches!(
            decode(raw.view().into_dyn(), 0.3, &identity()),
            Err(DetectError::Inference(_))
        ));
    }

    #[test]
    fn nms_keeps_overlapping_boxes_of_other_classes() {
        let kept = non_max_suppression(
            vec![det(0, 0.9, 0.0, 10.0), det(1, 0.8, 0.0, 10.0)],
            0.7,
            10,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn nms_respects_max_detections() {
        let candidates = (0..5)
            .map(|i| det(0, 0.5 + i as f32 * 0.01, i as f32 * 100.0, i as f32 * 100.0 + 10.0))
            .collect();
        let kept = non_max_suppression(candidates, 0.7, 3);
        assert_eq!(kept.len(), 3);
        assert!(kept[0].confidence > kept[2].confidence);
    }
}
