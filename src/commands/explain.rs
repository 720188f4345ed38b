use std::path::Path;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::view::ExplainView;

pub struct ExplainCommand;

/// Token usage of a finished explain action, as a state change.
pub(super) fn usage_result(view: &ExplainView) -> CommandResult {
    match view.usage {
        Some(usage) if usage.total() > 0 => CommandResult::StateChanged(StateChange::Usage(usage)),
        _ => CommandResult::Handled,
    }
}

#[async_trait]
impl Command for ExplainCommand {
    fn name(&self) -> &str {
        "/explain"
    }

    fn usage(&self) -> &str {
        "<file>"
    }

    fn description(&self) -> &str {
        "explain a code file"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            eprintln!("  ✗ usage: /explain <file>");
            return CommandResult::Handled;
        }
        let Some(app) = info.app else {
            eprintln!("  ✗ explanations not available");
            return CommandResult::Handled;
        };
        let view = app.explain_file(info.settings, Path::new(args)).await;
        app.print_explain(&view);
        usage_result(&view)
    }
}
