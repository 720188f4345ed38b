//! Uploaded images are staged in a temporary file for the detector and
//! removed when the [`StagedImage`] is dropped.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::DetectError;
use crate::consts::MAX_IMAGE_BYTES;

/// Image extensions accepted for detection.
pub const ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A validated upload written to disk. Deleted on drop.
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
}

impl StagedImage {
    /// Validate `bytes` against the upload rules and write them to a
    /// temporary file that keeps the upload's extension.
    pub fn stage(file_name: &str, bytes: &[u8]) -> Result<Self, DetectError> {
        let ext = upload_extension(file_name)?;
        if bytes.is_empty() {
            return Err(DetectError::EmptyImage);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DetectError::ImageTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        let mut file = tempfile::Builder::new()
            .prefix("glance-upload-")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .map_err(DetectError::Staging)?;
        file.write_all(bytes).map_err(DetectError::Staging)?;
        file.flush().map_err(DetectError::Staging)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Lower-cased extension of an accepted image name.
pub fn upload_extension(file_name: &str) -> Result<String, DetectError> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ACCEPTED_IMAGE_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| DetectError::UnsupportedImage(file_name.to_string()))
}
