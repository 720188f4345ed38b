use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange, apply, parse_value, select};
use crate::explain::Language;

pub struct LangCommand;

fn label(language: Option<Language>) -> String {
    language
        .map(|l| l.display_name().to_string())
        .unwrap_or_else(|| "automatic language detection".to_string())
}

#[async_trait]
impl Command for LangCommand {
    fn name(&self) -> &str {
        "/lang"
    }

    fn usage(&self) -> &str {
        "[language|auto]"
    }

    fn description(&self) -> &str {
        "force the language hint, or infer it from the file with auto"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let current = info.settings.language;
        let outcome = if args.eq_ignore_ascii_case("auto") {
            Ok(Some(None))
        } else {
            select(
                info,
                args,
                "Languages",
                current.unwrap_or_default(),
                |l: Language| l.display_name().to_string(),
                parse_value,
            )
            .await
            .map(|choice| choice.map(Some))
        };
        apply(outcome, current, label, StateChange::Language)
    }
}
