use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::app::Settings;
use crate::detect::ModelVersion;
use crate::detect::cache::DetectorCache;
use crate::explain::TextModel;

pub struct ModelsCommand;

/// Both model catalogs, marking the current choices and, when a cache is
/// given, whether each detector's weights are present and loaded.
pub fn catalog(settings: &Settings, cache: Option<&DetectorCache>) -> String {
    let mut out = String::from("  Explanation models\n");
    for model in TextModel::ALL {
        let marker = if model == settings.model { " ← current" } else { "" };
        out.push_str(&format!(
            "    {:<10} {} ({}){marker}\n",
            model.label(),
            model.display_name(),
            model.id()
        ));
    }

    out.push_str("\n  Posture detectors\n");
    let loaded = cache.map(DetectorCache::loaded).unwrap_or_default();
    for version in ModelVersion::ALL {
        let state = match cache {
            Some(_) if loaded.contains(&version) => " [loaded]",
            Some(cache) if !cache.weights_for(version).is_file() => " [weights missing]",
            _ => "",
        };
        let marker = if version == settings.detector { " ← current" } else { "" };
        out.push_str(&format!(
            "    {:<10} {} - {}{state}{marker}\n",
            version.label(),
            version.display_name(),
            version.description()
        ));
    }
    if let Some(cache) = cache {
        out.push_str(&format!("\n  weights dir  {}\n", cache.models_dir().display()));
    }
    out
}

#[async_trait]
impl Command for ModelsCommand {
    fn name(&self) -> &str {
        "/models"
    }

    fn description(&self) -> &str {
        "list explanation models and posture detectors"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        print!("{}", catalog(info.settings, info.app.map(|a| a.detectors())));
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;
    use crate::detect::onnx::OnnxLoader;
    use std::sync::Arc;

    #[test]
    fn catalog_marks_current_choices() {
        let text = catalog(&Settings::default(), None);
        assert!(text.contains("llama-3.3-70b-versatile) ← current"));
        assert!(text.contains("YOLOv10 - Original YOLO model version ← current"));
        assert!(text.contains("gemma2-9b-it"));
        assert!(!text.contains("weights dir"));
    }

    #[test]
    fn catalog_reports_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let v11 = dir.path().join(ModelVersion::V11.weights_path());
        std::fs::create_dir_all(v11.parent().unwrap()).unwrap();
        std::fs::write(&v11, b"onnx").unwrap();

        let cache = DetectorCache::new(Arc::new(OnnxLoader), dir.path());
        let text = catalog(&Settings::default(), Some(&cache));
        let v10_line = text.lines().find(|l| l.contains("YOLOv10")).unwrap();
        let v11_line = text.lines().find(|l| l.contains("YOLOv11")).unwrap();
        assert!(v10_line.contains("[weights missing]"));
        assert!(!v11_line.contains("[weights missing]"));
        assert!(text.contains("weights dir"));
    }

    #[tokio::test]
    async fn returns_handled() {
        assert_eq!(
            ModelsCommand.execute("", &test_info()).await,
            CommandResult::Handled
        );
    }
}
