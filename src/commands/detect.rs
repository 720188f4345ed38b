use std::path::Path;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct DetectCommand;

#[async_trait]
impl Command for DetectCommand {
    fn name(&self) -> &str {
        "/detect"
    }

    fn usage(&self) -> &str {
        "<image>"
    }

    fn description(&self) -> &str {
        "detect postures in a jpg or png image"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  ✗ usage: /detect <image>");
            return CommandResult::Handled;
        }
        let Some(app) = info.app else {
            eprintln!("  ✗ detection not available");
            return CommandResult::Handled;
        };
        let view = app.detect_file(info.settings, Path::new(args)).await;
        app.print_detect(&view);
        CommandResult::Handled
    }
}
