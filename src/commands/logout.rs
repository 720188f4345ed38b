use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth;

pub struct LogoutCommand;

#[async_trait]
impl Command for LogoutCommand {
    fn name(&self) -> &str {
        "/logout"
    }

    fn description(&self) -> &str {
        "remove the stored API key"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if let Err(e) = auth::logout(info.db_path) {
            eprintln!("  ✗ {e:#}");
            return CommandResult::Handled;
        }
        println!("  ✓ API key removed");
        CommandResult::StateChanged(StateChange::Auth(auth::status(info.db_path)))
    }
}
