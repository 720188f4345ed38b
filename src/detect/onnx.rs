//! YOLO detectors exported to ONNX, run on CPU through ONNX Runtime.

use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex};

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Value;
use regex::Regex;
use tracing::{debug, info, warn};

use super::yolo::{decode, preprocess};
use super::{DetectError, Detection, Detector, DetectorLoader, LabelTable, ModelVersion};

/// Metadata key under which Ultralytics exports store class names.
const NAMES_KEY: &str = "names";

/// Largest class id accepted from model metadata. Exported posture models
/// have a handful of classes; anything past this is corrupt metadata.
const MAX_CLASS_ID: usize = 4096;

/// Matches one `0: 'name'` entry of an exported names dict.
static NAME_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("name entry pattern is valid")
});

/// A YOLO detector backed by an ONNX Runtime session.
pub struct OnnxDetector {
    session: Mutex<Session>,
    input_name: String,
    labels: LabelTable,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Load a detector from an exported `.onnx` weight file.
    pub fn load(weights: &Path) -> Result<Self, DetectError> {
        if !weights.is_file() {
            return Err(DetectError::WeightsMissing(weights.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| load_error(weights, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(weights, e))?
            .with_intra_threads(4)
            .map_err(|e| load_error(weights, e))?
            .commit_from_file(weights)
            .map_err(|e| load_error(weights, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let labels = match session.metadata().and_then(|m| m.custom(NAMES_KEY)) {
            Ok(Some(raw)) => parse_names(&raw),
            Ok(None) => LabelTable::unavailable(),
            Err(e) => {
                warn!("could not read model metadata: {e}");
                LabelTable::unavailable()
            }
        };

        debug!(input = %input_name, labels = ?labels.names(), "detector session ready");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            labels,
        })
    }
}

fn load_error(weights: &Path, e: impl std::fmt::Display) -> DetectError {
    DetectError::Load(format!("{}: {e}", weights.display()))
}

impl Detector for OnnxDetector {
    fn labels(&self) -> &LabelTable {
        &self.labels
    }

    fn detect(&self, source: &Path, confidence: f32) -> Result<Vec<Detection>, DetectError> {
        let image = image::open(source).map_err(|e| DetectError::Decode(e.to_string()))?;
        let (tensor, letterbox) = preprocess(&image);

        let input = Value::from_array(tensor)
            .map_err(|e| DetectError::Inference(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("detector session poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| DetectError::Inference(e.to_string()))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectError::Inference(format!("failed to extract output tensor: {e}")))?;

        let detections = decode(output.view(), confidence, &letterbox)?;
        debug!(count = detections.len(), "detections decoded");
        Ok(detections)
    }
}

/// Loads [`OnnxDetector`]s for the detector cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxLoader;

impl DetectorLoader for OnnxLoader {
    fn load(&self, version: ModelVersion, weights: &Path) -> Result<Arc<dyn Detector>, DetectError> {
        let detector = OnnxDetector::load(weights)?;
        info!(
            version = version.label(),
            labels = detector.labels().is_available(),
            "detector loaded"
        );
        Ok(Arc::new(detector))
    }
}

/// Parse an exported names dict such as `{0: 'good', 1: 'slouching'}`.
///
/// Gaps in the index sequence are filled with `class {id}`. Entries with an
/// id above [`MAX_CLASS_ID`] are dropped. Anything without a single usable
/// entry yields an unavailable table.
pub fn parse_names(raw: &str) -> LabelTable {
    let mut entries: Vec<(usize, String)> = Vec::new();
    for caps in NAME_ENTRY.captures_iter(raw) {
        let Some(id) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
            warn!(entry = &caps[0], "ignoring class name with unparsable id");
            continue;
        };
        if id > MAX_CLASS_ID {
            warn!(id, max = MAX_CLASS_ID, "ignoring class name with out-of-range id");
            continue;
        }
        if let Some(name) = caps.get(2).or_else(|| caps.get(3)) {
            entries.push((id, name.as_str().to_string()));
        }
    }

    entries.sort_by_key(|(id, _)| *id);
    let Some(len) = entries.last().and_then(|(id, _)| id.checked_add(1)) else {
        return LabelTable::unavailable();
    };
    let mut names: Vec<String> = (0..len).map(|id| format!("class {id}")).collect();
    for (id, name) in entries {
        names[id] = name;
    }
    LabelTable::new(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_quoted_names() {
        let labels = parse_names("{0: 'good', 1: 'bad', 2: 'slouching'}");
        assert_eq!(
            labels.names().unwrap(),
            &["good".to_string(), "bad".to_string(), "slouching".to_string()]
        );
    }

    #[test]
    fn parse_double_quoted_names_with_apostrophe() {
        let labels = parse_names(r#"{0: "head's down", 1: 'upright'}"#);
        assert_eq!(labels.get(0), Some("head's down"));
        assert_eq!(labels.get(1), Some("upright"));
    }

    #[test]
    fn parse_fills_gaps() {
        let labels = parse_names("{2: 'slouching', 0: 'good'}");
        assert_eq!(labels.names().unwrap().len(), 3);
        assert_eq!(labels.get(1), Some("class 1"));
        assert_eq!(labels.get(2), Some("slouching"));
    }

    #[test]
    fn parse_ignores_out_of_range_ids() {
        let labels = parse_names("{0: 'good', 4000000000: 'huge', 1: 'slouching'}");
        assert_eq!(
            labels.names().unwrap(),
            &["good".to_string(), "slouching".to_string()]
        );
    }

    #[test]
    fn parse_max_usize_id_is_unavailable() {
        let raw = format!("{{{}: 'x'}}", usize::MAX);
        assert!(!parse_names(&raw).is_available());
        assert!(!parse_names("{99999999999999999999999: 'x'}").is_available());
    }

    #[test]
    fn parse_accepts_largest_allowed_id() {
        let raw = format!("{{{MAX_CLASS_ID}: 'last'}}");
        let labels = parse_names(&raw);
        assert_eq!(labels.names().unwrap().len(), MAX_CLASS_ID + 1);
        assert_eq!(labels.get(MAX_CLASS_ID), Some("last"));
    }

    #[test]
    fn parse_garbage_is_unavailable() {
        assert!(!parse_names("").is_available());
        assert!(!parse_names("not a dict").is_available());
    }

    #[test]
    fn load_missing_weights_fails() {
        let err = OnnxDetector::load(Path::new("/nope/yolov10/best.onnx")).unwrap_err();
        assert!(matches!(err, DetectError::WeightsMissing(_)));
    }

    #[test]
    fn load_corrupt_weights_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.onnx");
        std::fs::write(&path, b"definitely not a protobuf").unwrap();
        let err = OnnxLoader.load(ModelVersion::V10, &path).err().unwrap();
        assert!(matches!(err, DetectError::Load(_)));
    }
}
