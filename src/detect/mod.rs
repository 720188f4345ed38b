//! Posture detection: detector seams, the per-version cache, ONNX inference,
//! result formatting, and annotation.

pub mod annotate;
pub mod cache;
pub mod onnx;
pub mod report;
pub mod staging;
pub mod yolo;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use thiserror::Error;

/// Which trained detector to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum ModelVersion {
    #[default]
    #[value(name = "v10", alias = "yolov10")]
    V10,
    #[value(name = "v11", alias = "yolov11")]
    V11,
    #[value(name = "v12", alias = "yolov12")]
    V12,
}

impl ModelVersion {
    pub const ALL: [ModelVersion; 3] = [ModelVersion::V10, ModelVersion::V11, ModelVersion::V12];

    pub fn label(self) -> &'static str {
        match self {
            ModelVersion::V10 => "v10",
            ModelVersion::V11 => "v11",
            ModelVersion::V12 => "v12",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelVersion::V10 => "YOLOv10",
            ModelVersion::V11 => "YOLOv11",
            ModelVersion::V12 => "YOLOv12",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModelVersion::V10 => "Original YOLO model version",
            ModelVersion::V11 => "Enhanced version with improved accuracy",
            ModelVersion::V12 => "Latest version with advanced features",
        }
    }

    /// Weight file location, relative to the models directory.
    pub fn weights_path(self) -> &'static str {
        match self {
            ModelVersion::V10 => "yolov10/best.onnx",
            ModelVersion::V11 => "yolov11/best.onnx",
            ModelVersion::V12 => "yolov12/best.onnx",
        }
    }

    /// Parse a user-supplied label such as `v11` or `YOLOv11`.
    pub fn parse(label: &str) -> Result<Self, DetectError> {
        <Self as ValueEnum>::from_str(label.trim(), true)
            .map_err(|_| DetectError::UnknownModel(label.to_string()))
    }

    fn index(self) -> usize {
        match self {
            ModelVersion::V10 => 0,
            ModelVersion::V11 => 1,
            ModelVersion::V12 => 2,
        }
    }
}

/// Axis-aligned box in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    /// Detector score in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Class names known to a detector. Not every weight file carries them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    names: Option<Vec<String>>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names: Some(names) }
    }

    pub fn unavailable() -> Self {
        Self { names: None }
    }

    pub fn is_available(&self) -> bool {
        self.names.is_some()
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.as_ref()?.get(class_id).map(String::as_str)
    }

    /// Name for `class_id`, or `class {id}` when it cannot be resolved.
    pub fn resolve(&self, class_id: usize) -> String {
        self.get(class_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class {class_id}"))
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model {0} not found! Available models: v10, v11, v12")]
    UnknownModel(String),

    #[error("weights not found: {}", .0.display())]
    WeightsMissing(PathBuf),

    #[error("failed to load detector: {0}")]
    Load(String),

    #[error("unsupported image type: {0} (expected jpg, jpeg or png)")]
    UnsupportedImage(String),

    #[error("image is too large: {0} bytes (max: {1} bytes)")]
    ImageTooLarge(usize, usize),

    #[error("image is empty")]
    EmptyImage,

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to stage image: {0}")]
    Staging(#[source] std::io::Error),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("failed to write annotated image: {0}")]
    Annotate(String),
}

/// A loaded detector. Shared across requests, so implementations must be
/// usable through `&self` from any thread.
pub trait Detector: Send + Sync {
    fn labels(&self) -> &LabelTable;

    /// Detect objects in the image at `source`, keeping boxes scored at or
    /// above `confidence`. Boxes come back in the detector's native order.
    fn detect(&self, source: &Path, confidence: f32) -> Result<Vec<Detection>, DetectError>;
}

/// Builds detectors from weight files.
pub trait DetectorLoader: Send + Sync {
    fn load(&self, version: ModelVersion, weights: &Path) -> Result<Arc<dyn Detector>, DetectError>;
}
