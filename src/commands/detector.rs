use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange, apply, select};
use crate::detect::ModelVersion;

pub struct DetectorCommand;

#[async_trait]
impl Command for DetectorCommand {
    fn name(&self) -> &str {
        "/detector"
    }

    fn usage(&self) -> &str {
        "[version]"
    }

    fn description(&self) -> &str {
        "switch the posture detector (v10, v11, v12)"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let current = info.settings.detector;
        let outcome = select(
            info,
            args,
            "Detectors",
            current,
            |v: ModelVersion| format!("{} - {}", v.display_name(), v.description()),
            |s| ModelVersion::parse(s).map_err(|e| e.to_string()),
        )
        .await;
        apply(
            outcome,
            current,
            |v| v.display_name().to_string(),
            StateChange::Detector,
        )
    }
}
