use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange, apply, parse_value, select};
use crate::explain::DetailLevel;

pub struct DetailCommand;

#[async_trait]
impl Command for DetailCommand {
    fn name(&self) -> &str {
        "/detail"
    }

    fn usage(&self) -> &str {
        "[level]"
    }

    fn description(&self) -> &str {
        "set the explanation detail (basic, medium, detailed)"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let current = info.settings.detail;
        let outcome = select(
            info,
            args,
            "Detail levels",
            current,
            |d: DetailLevel| d.label().to_string(),
            parse_value,
        )
        .await;
        apply(
            outcome,
            current,
            |d| format!("{} detail", d.label()),
            StateChange::Detail,
        )
    }
}
