//! Process-lifetime cache of loaded detectors, one slot per [`ModelVersion`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{DetectError, Detector, DetectorLoader, ModelVersion};

/// Lazily loads each detector version on first use and hands out the same
/// instance afterwards. Concurrent first requests for one version wait on a
/// single load. A failed load leaves the slot empty.
pub struct DetectorCache {
    loader: Arc<dyn DetectorLoader>,
    models_dir: PathBuf,
    slots: [OnceCell<Arc<dyn Detector>>; 3],
}

impl DetectorCache {
    pub fn new(loader: Arc<dyn DetectorLoader>, models_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            models_dir: models_dir.into(),
            slots: [OnceCell::new(), OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Absolute-ish path of the weight file for `version`.
    pub fn weights_for(&self, version: ModelVersion) -> PathBuf {
        self.models_dir.join(version.weights_path())
    }

    /// Get the detector for a user-supplied label such as `"v11"`.
    pub async fn get(&self, label: &str) -> Result<Arc<dyn Detector>, DetectError> {
        let version = ModelVersion::parse(label)?;
        self.get_version(version).await
    }

    /// Get the detector for `version`, loading it if this is the first request.
    pub async fn get_version(&self, version: ModelVersion) -> Result<Arc<dyn Detector>, DetectError> {
        let slot = &self.slots[version.index()];
        if let Some(detector) = slot.get() {
            debug!(version = version.label(), "detector cache hit");
            return Ok(Arc::clone(detector));
        }

        let detector = slot
            .get_or_try_init(|| async {
                let weights = self.weights_for(version);
                if !weights.is_file() {
                    return Err(DetectError::WeightsMissing(weights));
                }
                info!(version = version.label(), weights = %weights.display(), "loading detector");
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load(version, &weights))
                    .await
                    .map_err(|e| DetectError::Load(format!("loader task failed: {e}")))?
            })
            .await?;
        Ok(Arc::clone(detector))
    }

    /// Versions that currently have a loaded detector.
    pub fn loaded(&self) -> Vec<ModelVersion> {
        ModelVersion::ALL
            .into_iter()
            .filter(|v| self.slots[v.index()].initialized())
            .collect()
    }
}
