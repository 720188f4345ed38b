use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct StatusCommand;

/// Current settings, one per line.
fn status_text(info: &SessionInfo<'_>) -> String {
    let settings = info.settings;
    let mut out = format!(
        "  model     {} ({})\n  detail    {}\n  language  {}\n  detector  {}\n  auth      {}\n",
        settings.model.display_name(),
        settings.model.id(),
        settings.detail.label(),
        settings.language_label(),
        settings.detector.display_name(),
        info.auth_status,
    );
    if let Some(app) = info.app {
        let loaded: Vec<&str> = app
            .detectors()
            .loaded()
            .into_iter()
            .map(|v| v.label())
            .collect();
        let loaded = if loaded.is_empty() {
            "none".to_string()
        } else {
            loaded.join(", ")
        };
        out.push_str(&format!("  loaded    {loaded}\n"));
        out.push_str(&format!("  output    {}\n", app.output_dir().display()));
    }
    out
}

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "/status"
    }

    fn aliases(&self) -> &[&str] {
        &["/whoami"]
    }

    fn description(&self) -> &str {
        "show model, detail, language, detector, and auth status"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        print!("{}", status_text(info));
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[tokio::test]
    async fn returns_handled() {
        assert_eq!(
            StatusCommand.execute("", &test_info()).await,
            CommandResult::Handled
        );
    }

    #[test]
    fn text_lists_settings() {
        let text = status_text(&test_info());
        assert!(text.contains("Llama 3.3 70B (llama-3.3-70b-versatile)"));
        assert!(text.contains("detail    medium"));
        assert!(text.contains("language  auto"));
        assert!(text.contains("YOLOv10"));
        assert!(text.contains("API key ✓"));
        assert!(!text.contains("loaded"));
    }
}
