use async_trait::async_trait;

use super::explain::usage_result;
use super::{Command, CommandResult, SessionInfo, read_until_eof};

pub struct PasteCommand;

#[async_trait]
impl Command for PasteCommand {
    fn name(&self) -> &str {
        "/paste"
    }

    fn description(&self) -> &str {
        "paste multi-line code, ended by a line reading EOF"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let (Some(app), Some(input)) = (info.app, info.input) else {
            eprintln!("  ✗ explanations not available");
            return CommandResult::Handled;
        };

        println!("  Paste your code, then a line reading EOF:");
        let code = match read_until_eof(&mut *input.lock().await).await {
            Ok(code) if code.trim().is_empty() => {
                eprintln!("  ✗ nothing was pasted");
                return CommandResult::Handled;
            }
            Ok(code) => code,
            Err(e) => {
                eprintln!("  ✗ failed to read input: {e}");
                return CommandResult::Handled;
            }
        };

        let view = app.explain_code(info.settings, code).await;
        app.print_explain(&view);
        usage_result(&view)
    }
}
