use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::consts::CONFIDENCE_THRESHOLD;
use crate::detect::annotate::{draw_detections, output_path, save};
use crate::detect::cache::DetectorCache;
use crate::detect::report::format_detections;
use crate::detect::staging::StagedImage;
use crate::detect::{DetectError, ModelVersion};
use crate::view::{DetectView, Notice};

/// One detection action. Lives only as long as the request.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Name of the uploaded file; only its extension and stem are used.
    pub file_name: String,
    pub image: Vec<u8>,
    pub version: ModelVersion,
}

/// Run detection on the request's image and describe the outcome.
///
/// The upload is staged in a temporary file that is removed before this
/// returns, on success and on every failure.
pub async fn run(cache: &DetectorCache, request: &DetectionRequest, output_dir: &Path) -> DetectView {
    let mut view = DetectView {
        version: Some(request.version),
        ..DetectView::default()
    };

    if let Err(e) = detect(cache, request, output_dir, &mut view).await {
        warn!(error = %e, "detection failed");
        view.annotated = None;
        view.labels = None;
        view.report = None;
        view.notices.push(Notice::Error(e.to_string()));
    }
    view
}

async fn detect(
    cache: &DetectorCache,
    request: &DetectionRequest,
    output_dir: &Path,
    view: &mut DetectView,
) -> Result<(), DetectError> {
    let staged = StagedImage::stage(&request.file_name, &request.image)?;
    let detector = cache.get_version(request.version).await?;

    info!(
        version = request.version.label(),
        image = %request.file_name,
        bytes = request.image.len(),
        "running detection"
    );
    let source = staged.path().to_path_buf();
    let worker = Arc::clone(&detector);
    let detections = tokio::task::spawn_blocking(move || worker.detect(&source, CONFIDENCE_THRESHOLD))
        .await
        .map_err(|e| DetectError::Inference(format!("inference task failed: {e}")))??;

    let source = image::open(staged.path()).map_err(|e| DetectError::Decode(e.to_string()))?;
    let annotated = draw_detections(&source, &detections);
    let path = output_path(output_dir, &request.file_name, request.version.label());
    save(&annotated, &path)?;

    let labels = detector.labels();
    view.annotated = Some(path);
    view.labels = labels.names().map(<[String]>::to_vec);
    view.report = Some(format_detections(&detections, labels));
    Ok(())
}
