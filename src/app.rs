//! The running application: the explainer, the detector cache, and the
//! per-session settings the REPL and subcommands act on.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::commands::StateChange;
use crate::detect::ModelVersion;
use crate::consts::MAX_IMAGE_BYTES;
use crate::detect::DetectError;
use crate::detect::cache::DetectorCache;
use crate::explain::source::{SourceError, read_code, read_code_file};
use crate::explain::{DetailLevel, Explainer, ExplanationRequest, Language, TextModel, TokenUsage};
use crate::flow;
use crate::flow::detect::DetectionRequest;
use crate::spinner::Spinner;
use crate::view::{DetectView, ExplainView, Notice};

/// User-selected options for the current session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub model: TextModel,
    pub detail: DetailLevel,
    /// Forced language hint. `None` infers it from the file extension.
    pub language: Option<Language>,
    pub detector: ModelVersion,
}

impl Settings {
    /// Language for code read from `path`, or typed in when `path` is `None`.
    pub fn language_for(&self, path: Option<&Path>) -> Language {
        self.language
            .or_else(|| {
                path.and_then(|p| p.extension())
                    .and_then(|e| e.to_str())
                    .and_then(Language::from_extension)
            })
            .unwrap_or(Language::Other)
    }

    pub fn language_label(&self) -> &'static str {
        match self.language {
            Some(language) => language.display_name(),
            None => "auto",
        }
    }
}

/// Mutable REPL state: the settings plus what the banner and `/tokens` show.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub settings: Settings,
    pub auth_status: String,
    pub usage: TokenUsage,
}

impl Session {
    pub fn new(settings: Settings, auth_status: String) -> Self {
        Self {
            settings,
            auth_status,
            usage: TokenUsage::default(),
        }
    }

    /// Apply a state change produced by a command.
    pub fn apply(&mut self, change: StateChange) {
        match change {
            StateChange::Auth(status) => self.auth_status = status,
            StateChange::Model(model) => self.settings.model = model,
            StateChange::Detail(detail) => self.settings.detail = detail,
            StateChange::Language(language) => self.settings.language = language,
            StateChange::Detector(version) => self.settings.detector = version,
            StateChange::Usage(usage) => self.usage.add(usage),
        }
    }

    /// Record the tokens an explanation spent.
    pub fn record(&mut self, view: &ExplainView) {
        if let Some(usage) = view.usage {
            self.usage.add(usage);
        }
    }
}

pub struct App {
    explainer: Box<dyn Explainer>,
    detectors: DetectorCache,
    output_dir: PathBuf,
    styled: bool,
}

impl App {
    pub fn new(explainer: Box<dyn Explainer>, detectors: DetectorCache, output_dir: PathBuf) -> Self {
        Self {
            explainer,
            detectors,
            output_dir,
            styled: io::stdout().is_terminal(),
        }
    }

    /// Force ANSI styling on or off.
    pub fn with_styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn detectors(&self) -> &DetectorCache {
        &self.detectors
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Explain a snippet typed or pasted by the user.
    pub async fn explain_code(&self, settings: &Settings, code: String) -> ExplainView {
        let request = ExplanationRequest {
            code,
            language: settings.language_for(None),
            model: settings.model,
            detail: settings.detail,
        };
        self.explain(request).await
    }

    /// Explain the contents of a code file.
    pub async fn explain_file(&self, settings: &Settings, path: &Path) -> ExplainView {
        let file = match read_code_file(path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "code file rejected");
                return rejected(e);
            }
        };
        let request = ExplanationRequest {
            code: file.code.clone(),
            language: settings.language.unwrap_or(file.language),
            model: settings.model,
            detail: settings.detail,
        };
        let mut view = self.explain(request).await;
        view.code = Some(file.code);
        view
    }

    /// Explain code piped in on `reader` (stdin for `glance explain`).
    pub async fn explain_reader(&self, settings: &Settings, reader: impl Read) -> ExplainView {
        let code = match read_code(reader) {
            Ok(code) => code,
            Err(e) => {
                debug!(error = %e, "piped code rejected");
                return rejected(e);
            }
        };
        let mut view = self.explain_code(settings, code.clone()).await;
        view.code = Some(code);
        view
    }

    async fn explain(&self, request: ExplanationRequest) -> ExplainView {
        let message = format!("Analyzing your code with {}...", request.model.display_name());
        Spinner::during(&message, flow::explain::run(self.explainer.as_ref(), &request)).await
    }

    /// Run the selected detector on an image file.
    pub async fn detect_file(&self, settings: &Settings, path: &Path) -> DetectView {
        let failed = |message: String| DetectView {
            version: Some(settings.detector),
            notices: vec![Notice::Error(message)],
            ..DetectView::default()
        };
        let unreadable = |e: io::Error| failed(format!("failed to read {}: {e}", path.display()));

        // Size comes from metadata so an oversized image is never loaded.
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => return unreadable(e),
        };
        if size > MAX_IMAGE_BYTES as u64 {
            let size = usize::try_from(size).unwrap_or(usize::MAX);
            return failed(DetectError::ImageTooLarge(size, MAX_IMAGE_BYTES).to_string());
        }
        let image = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return unreadable(e),
        };
        let request = DetectionRequest {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            image,
            version: settings.detector,
        };
        let message = format!("Processing with {}...", settings.detector.display_name());
        Spinner::during(
            &message,
            flow::detect::run(&self.detectors, &request, &self.output_dir),
        )
        .await
    }

    pub fn print_explain(&self, view: &ExplainView) {
        let _ = view.render(&mut io::stdout().lock(), self.styled);
    }

    pub fn print_detect(&self, view: &DetectView) {
        let _ = view.render(&mut io::stdout().lock());
    }
}

fn rejected(e: SourceError) -> ExplainView {
    ExplainView {
        notices: vec![Notice::Error(e.to_string())],
        ..ExplainView::default()
    }
}
