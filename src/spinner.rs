//! A minimal terminal spinner for visual feedback while a flow runs.

use std::future::Future;
use std::io::{IsTerminal, Write};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// A terminal spinner drawn on stderr by a background task.
///
/// When stderr is not a terminal nothing is drawn, so piped output and
/// logs stay clean.
pub struct Spinner {
    inner: Option<(JoinHandle<()>, watch::Sender<bool>)>,
}

impl Spinner {
    /// Start a spinner with the given message (e.g. `"Analyzing your code..."`).
    pub fn start(message: &str) -> Self {
        if !std::io::stderr().is_terminal() {
            return Self { inner: None };
        }
        Self::spawn(message.to_string())
    }

    fn spawn(message: String) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            for frame in FRAMES.iter().cycle() {
                // \r moves to start of line, \x1b[2K clears the line
                eprint!("\x1b[2K\r{frame} {message}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });
        Self {
            inner: Some((handle, cancel_tx)),
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(mut self) {
        if let Some((handle, cancel)) = self.inner.take() {
            let _ = cancel.send(true);
            let _ = handle.await;
        }
    }

    /// Show a spinner while `work` runs, then clear it.
    pub async fn during<F: Future>(message: &str, work: F) -> F::Output {
        let spinner = Self::start(message);
        let output = work.await;
        spinner.stop().await;
        output
    }
}

impl Drop for Spinner {
    // Dropped mid-action when Ctrl+C cancels the surrounding future.
    fn drop(&mut self) {
        if let Some((_, cancel)) = self.inner.take() {
            let _ = cancel.send(true);
        }
    }
}
