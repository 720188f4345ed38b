//! What each flow shows the user, and how it is written to the terminal.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::detect::ModelVersion;
use crate::detect::report::DetectionReport;
use crate::explain::{Language, TextModel, TokenUsage};
use crate::markdown;

/// A message shown next to (or instead of) a flow's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Warning(String),
    Info(String),
}

impl Notice {
    fn write(&self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Notice::Error(msg) => writeln!(out, "  ✗ Error: {msg}"),
            Notice::Warning(msg) => writeln!(out, "  ! {msg}"),
            Notice::Info(msg) => writeln!(out, "  {msg}"),
        }
    }
}

/// Count the error notices in a list.
pub fn error_count(notices: &[Notice]) -> usize {
    notices
        .iter()
        .filter(|n| matches!(n, Notice::Error(_)))
        .count()
}

const EXPLAIN_TIPS: &str = "You can:
- Change the detail level with /detail
- Try different models with /model for different perspectives
- Load a different file with /explain or paste new code with /paste";

/// Result of one explain action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplainView {
    pub model: Option<TextModel>,
    pub language: Option<Language>,
    /// Code loaded from a file or stdin, echoed above the explanation.
    pub code: Option<String>,
    pub explanation: Option<String>,
    pub usage: Option<TokenUsage>,
    pub notices: Vec<Notice>,
}

impl ExplainView {
    pub fn errors(&self) -> usize {
        error_count(&self.notices)
    }

    pub fn render(&self, out: &mut impl Write, styled: bool) -> io::Result<()> {
        if let Some(code) = &self.code {
            let heading = match self.language {
                Some(language) if language != Language::Other => {
                    format!("## Code ({})", language.display_name())
                }
                _ => "## Code".to_string(),
            };
            write!(out, "\n{}", markdown::render(&heading, styled))?;
            write!(out, "\n{}", markdown::render(&fenced(code), styled))?;
        }
        if let Some(text) = &self.explanation {
            let heading = match (self.model, self.language) {
                (Some(model), Some(language)) if language != Language::Other => {
                    format!("## Explanation ({}, {})", language.display_name(), model.display_name())
                }
                (Some(model), _) => format!("## Explanation ({})", model.display_name()),
                _ => "## Explanation".to_string(),
            };
            write!(out, "\n{}", markdown::render(&heading, styled))?;
            write!(out, "\n{}", markdown::render(text, styled))?;
            write!(out, "\n{}", markdown::render(EXPLAIN_TIPS, styled))?;
        }
        for notice in &self.notices {
            notice.write(out)?;
        }
        Ok(())
    }
}

/// Wrap `code` in a fence longer than any backtick run inside it.
fn fenced(code: &str) -> String {
    let longest = code
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat((longest + 1).max(3));
    format!("{fence}\n{}\n{fence}", code.trim_end_matches('\n'))
}

/// Result of one detection action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectView {
    pub version: Option<ModelVersion>,
    pub annotated: Option<PathBuf>,
    /// Class names of the detector, when it carries them.
    pub labels: Option<Vec<String>>,
    pub report: Option<DetectionReport>,
    pub notices: Vec<Notice>,
}

impl DetectView {
    pub fn errors(&self) -> usize {
        error_count(&self.notices)
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        if let Some(path) = &self.annotated {
            let model = self
                .version
                .map(|v| v.display_name())
                .unwrap_or("detector");
            writeln!(out, "\n  {model} detection result: {}", path.display())?;
        }
        if let Some(labels) = &self.labels {
            writeln!(out, "\n  Class labels")?;
            for (id, name) in labels.iter().enumerate() {
                writeln!(out, "    {id}: {name}")?;
            }
        }
        match &self.report {
            Some(DetectionReport::NoDetections) => {
                writeln!(out, "\n  No detections above the confidence threshold.")?;
            }
            Some(report) => {
                writeln!(out, "\n  Detection results")?;
                write!(out, "{}", report.to_table())?;
            }
            None => {}
        }
        for notice in &self.notices {
            notice.write(out)?;
        }
        Ok(())
    }
}
