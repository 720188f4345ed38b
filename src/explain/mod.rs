//! Code explanation: request types, the [`Explainer`] seam, and its errors.

pub mod groq;
pub mod mock;
pub mod prompt;
pub mod source;

use async_trait::async_trait;
use clap::ValueEnum;
use thiserror::Error;

/// How much explanation the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DetailLevel {
    Basic,
    #[default]
    Medium,
    Detailed,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 3] = [DetailLevel::Basic, DetailLevel::Medium, DetailLevel::Detailed];

    pub fn label(self) -> &'static str {
        match self {
            DetailLevel::Basic => "basic",
            DetailLevel::Medium => "medium",
            DetailLevel::Detailed => "detailed",
        }
    }
}

/// The hosted text-generation models on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TextModel {
    #[default]
    #[value(name = "llama-70b")]
    Llama70b,
    #[value(name = "llama-8b")]
    Llama8b,
    #[value(name = "gemma-9b")]
    Gemma9b,
}

impl TextModel {
    pub const ALL: [TextModel; 3] = [TextModel::Llama70b, TextModel::Llama8b, TextModel::Gemma9b];

    /// Provider-side model id sent on the wire.
    pub fn id(self) -> &'static str {
        match self {
            TextModel::Llama70b => "llama-3.3-70b-versatile",
            TextModel::Llama8b => "llama-3.1-8b-instant",
            TextModel::Gemma9b => "gemma2-9b-it",
        }
    }

    /// Short label accepted on the command line.
    pub fn label(self) -> &'static str {
        match self {
            TextModel::Llama70b => "llama-70b",
            TextModel::Llama8b => "llama-8b",
            TextModel::Gemma9b => "gemma-9b",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TextModel::Llama70b => "Llama 3.3 70B",
            TextModel::Llama8b => "Llama 3.1 8B",
            TextModel::Gemma9b => "Gemma 2 9B",
        }
    }
}

/// Programming language hint shown alongside the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Language {
    Python,
    #[value(name = "javascript", alias = "js")]
    JavaScript,
    Java,
    #[value(name = "cpp", alias = "c++")]
    Cpp,
    C,
    #[value(name = "html", alias = "css")]
    HtmlCss,
    Go,
    Ruby,
    Php,
    #[value(name = "typescript", alias = "ts")]
    TypeScript,
    #[value(name = "shell", alias = "sh")]
    Shell,
    Sql,
    R,
    Swift,
    #[default]
    Other,
}

impl Language {
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::HtmlCss => "HTML/CSS",
            Language::Go => "Go",
            Language::Ruby => "Ruby",
            Language::Php => "PHP",
            Language::TypeScript => "TypeScript",
            Language::Shell => "Shell",
            Language::Sql => "SQL",
            Language::R => "R",
            Language::Swift => "Swift",
            Language::Other => "Other",
        }
    }

    /// Map an accepted code-file extension to its language.
    /// Returns `None` for extensions that are not accepted as uploads.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_ascii_lowercase().as_str() {
            "py" => Language::Python,
            "js" => Language::JavaScript,
            "java" => Language::Java,
            "cpp" => Language::Cpp,
            "c" => Language::C,
            "html" | "css" => Language::HtmlCss,
            "go" => Language::Go,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "ts" => Language::TypeScript,
            "sh" => Language::Shell,
            "sql" => Language::Sql,
            "r" => Language::R,
            "swift" => Language::Swift,
            _ => return None,
        };
        Some(lang)
    }
}

/// One explain action. Lives only as long as the request.
#[derive(Debug, Clone)]
pub struct ExplanationRequest {
    pub code: String,
    pub language: Language,
    pub model: TextModel,
    pub detail: DetailLevel,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Accumulate another usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The provider's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("no Groq API key found. Run `glance login` or set GROQ_API_KEY.")]
    MissingCredential,

    #[error("credential store error: {0:#}")]
    Credentials(anyhow::Error),

    #[error("no code to explain")]
    EmptyInput,

    #[error("code is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Groq rejected the API key: {0}")]
    Unauthorized(String),

    #[error("Groq API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ExplainError {
    /// Whether supplying a (different) API key could fix this failure.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            ExplainError::MissingCredential | ExplainError::Unauthorized(_)
        )
    }
}

/// Sends a built prompt to a text model. A hosted LLM or a test script.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, model: TextModel, prompt: &str) -> Result<Explanation, ExplainError>;
}
