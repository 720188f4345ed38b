use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange, apply, parse_value, select};
use crate::explain::TextModel;

pub struct ModelCommand;

#[async_trait]
impl Command for ModelCommand {
    fn name(&self) -> &str {
        "/model"
    }

    fn usage(&self) -> &str {
        "[label]"
    }

    fn description(&self) -> &str {
        "list and switch the explanation model"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let current = info.settings.model;
        let outcome = select(
            info,
            args,
            "Available models",
            current,
            |m: TextModel| format!("{} ({})", m.display_name(), m.label()),
            parse_value,
        )
        .await;
        apply(
            outcome,
            current,
            |m| m.display_name().to_string(),
            StateChange::Model,
        )
    }
}
