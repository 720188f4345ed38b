//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry splits the command word from its
//! arguments, resolves aliases, and generates `/help` from the registered
//! descriptions.

mod detail;
mod detect;
mod detector;
mod explain;
mod help;
mod lang;
mod login;
mod logout;
mod model;
mod models;
mod paste;
mod quit;
mod status;
mod tokens;

use async_trait::async_trait;
use clap::ValueEnum;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::Mutex;

use crate::app::{App, Settings};
use crate::detect::ModelVersion;
use crate::explain::{DetailLevel, Language, TextModel, TokenUsage};

pub use models::catalog;

/// The REPL's line reader. Commands that prompt for more input read from
/// the same buffer so nothing typed ahead is lost.
pub type SharedInput = Mutex<Lines<Box<dyn AsyncBufRead + Unpin + Send>>>;

/// Wrap `reader` (stdin in the REPL) as a [`SharedInput`].
pub fn shared_input(reader: impl AsyncRead + Unpin + Send + 'static) -> SharedInput {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(BufReader::new(reader));
    Mutex::new(reader.lines())
}

/// Session info available to commands during execution.
pub struct SessionInfo<'a> {
    pub settings: &'a Settings,
    pub auth_status: &'a str,
    pub usage: TokenUsage,
    pub db_path: &'a str,
    /// Application handle for commands that run a flow (e.g. `/explain`).
    pub app: Option<&'a App>,
    /// Where prompts read their answers. `None` reads as end of input.
    pub input: Option<&'a SharedInput>,
}

impl SessionInfo<'_> {
    /// Read one more line of user input.
    pub async fn read_line(&self) -> io::Result<Option<String>> {
        match self.input {
            Some(input) => input.lock().await.next_line().await,
            None => Ok(None),
        }
    }
}

/// A state change the REPL needs to apply after a command runs.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    /// Auth status changed (new status string).
    Auth(String),
    Model(TextModel),
    Detail(DetailLevel),
    /// `None` goes back to inferring the language from the file.
    Language(Option<Language>),
    Detector(ModelVersion),
    /// Tokens spent by a flow the command ran.
    Usage(TokenUsage),
}

/// What the REPL should do after a command runs.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command. The input is code to explain.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Command produced a state change the REPL must apply.
    StateChanged(StateChange),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/status"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument hint shown in `/help`, e.g. `"<file>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is the trimmed text after the command word.
    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(status::StatusCommand),
            Arc::new(model::ModelCommand),
            Arc::new(detail::DetailCommand),
            Arc::new(lang::LangCommand),
            Arc::new(detector::DetectorCommand),
            Arc::new(models::ModelsCommand),
            Arc::new(explain::ExplainCommand),
            Arc::new(paste::PasteCommand),
            Arc::new(detect::DetectCommand),
            Arc::new(tokens::TokensCommand),
            Arc::new(login::LoginCommand),
            Arc::new(logout::LogoutCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let input = input.trim();
        if !input.starts_with('/') {
            return CommandResult::NotACommand;
        }
        let (cmd, args) = match input.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (input, ""),
        };

        for command in &self.commands {
            if cmd == command.name() || command.aliases().contains(&cmd) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, info).await;
            }
        }

        println!("unknown command: {cmd}");
        println!("type /help for available commands");
        CommandResult::Handled
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out.push_str("\n  anything else you type is explained as code\n");
        out
    }

    /// All registered command names.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

/// Parse a 1-based menu selection. Empty input keeps the current choice.
fn parse_selection(input: &str, count: usize) -> Result<Option<usize>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Ok(Some(n - 1)),
        _ => Err(format!("invalid selection: {input}")),
    }
}

/// Resolve a setting from the command's argument, or from a numbered menu
/// when no argument was given. `Ok(None)` means "keep the current value".
async fn select<T, F, P>(
    info: &SessionInfo<'_>,
    args: &str,
    title: &str,
    current: T,
    describe: F,
    parse: P,
) -> Result<Option<T>, String>
where
    T: ValueEnum + Copy + PartialEq,
    F: Fn(T) -> String,
    P: Fn(&str) -> Result<T, String>,
{
    if !args.is_empty() {
        return parse(args).map(Some);
    }

    let options = T::value_variants();
    println!("  {title}:\n");
    for (i, option) in options.iter().enumerate() {
        let marker = if *option == current { " ← current" } else { "" };
        println!("  {}. {}{}", i + 1, describe(*option), marker);
    }
    let current_idx = options.iter().position(|o| *o == current).map(|i| i + 1);
    let default_label = current_idx.map(|i| format!(" [{i}]")).unwrap_or_default();
    print!("\n  Select{default_label}: ");
    io::stdout()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;

    let input = info
        .read_line()
        .await
        .map_err(|e| format!("failed to read input: {e}"))?
        .unwrap_or_default();
    Ok(parse_selection(&input, options.len())?.map(|i| options[i]))
}

/// Parse a clap value name (or alias), ignoring case.
fn parse_value<T: ValueEnum>(input: &str) -> Result<T, String> {
    T::from_str(input.trim(), true)
}

/// Turn a selection outcome into a command result, reporting it.
fn apply<T: Copy + PartialEq>(
    outcome: Result<Option<T>, String>,
    current: T,
    name: impl Fn(T) -> String,
    change: impl Fn(T) -> StateChange,
) -> CommandResult {
    match outcome {
        Ok(Some(value)) if value == current => {
            println!("  already using {}", name(value));
            CommandResult::Handled
        }
        Ok(Some(value)) => {
            println!("  ✓ switched to {}", name(value));
            CommandResult::StateChanged(change(value))
        }
        Ok(None) => CommandResult::Handled,
        Err(e) => {
            eprintln!("  ✗ {e}");
            CommandResult::Handled
        }
    }
}

/// Read lines until one reads exactly `EOF` or input ends. Lines after the
/// marker stay in `lines`.
async fn read_until_eof<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> io::Result<String> {
    let mut code = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim_end() == "EOF" {
            break;
        }
        code.push(line);
    }
    Ok(code.join("\n"))
}
