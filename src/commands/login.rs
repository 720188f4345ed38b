use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::auth;

pub struct LoginCommand;

#[async_trait]
impl Command for LoginCommand {
    fn name(&self) -> &str {
        "/login"
    }

    fn description(&self) -> &str {
        "store a Groq API key"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        println!("  Create a key at https://console.groq.com/keys\n");
        print!("  Paste your Groq API key: ");
        if std::io::Write::flush(&mut std::io::stdout()).is_err() {
            return CommandResult::Handled;
        }

        let key = match info.read_line().await {
            Ok(Some(key)) => key,
            Ok(None) => {
                eprintln!("\n  ✗ no key entered");
                return CommandResult::Handled;
            }
            Err(e) => {
                eprintln!("  ✗ failed to read input: {e}");
                return CommandResult::Handled;
            }
        };

        match auth::login(info.db_path, &key) {
            Ok(()) => {
                println!("  ✓ API key saved");
                CommandResult::StateChanged(StateChange::Auth(auth::status(info.db_path)))
            }
            Err(e) => {
                eprintln!("  ✗ {e:#}");
                CommandResult::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::commands::shared_input;
    use crate::commands::tests::test_info;

    #[test]
    fn metadata() {
        assert_eq!(LoginCommand.name(), "/login");
        assert!(LoginCommand.description().contains("API key"));
    }

    #[tokio::test]
    async fn key_is_read_from_the_session_input() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("glance.db").to_string_lossy().into_owned();
        let input = shared_input("  gsk_test_key  \n/status\n".as_bytes());
        let info = SessionInfo {
            db_path: &db,
            input: Some(&input),
            ..test_info()
        };

        let result = LoginCommand.execute("", &info).await;
        assert_eq!(
            result,
            CommandResult::StateChanged(StateChange::Auth(auth::status(&db)))
        );
        assert_eq!(info.read_line().await.unwrap().as_deref(), Some("/status"));
    }

    #[tokio::test]
    async fn end_of_input_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("glance.db").to_string_lossy().into_owned();
        let info = SessionInfo {
            db_path: &db,
            ..test_info()
        };
        assert_eq!(LoginCommand.execute("", &info).await, CommandResult::Handled);
    }
}
