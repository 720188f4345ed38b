//! Startup banner and session summary display.

use std::path::Path;

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};
use crate::explain::TokenUsage;

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub model: &'a str,
    pub detail: &'a str,
    pub language: &'a str,
    pub detector: &'a str,
    pub auth_status: &'a str,
    pub models_dir: &'a Path,
    pub output_dir: &'a Path,
}

/// Build the startup banner text.
pub fn banner_text(info: &BannerInfo) -> String {
    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║             G L A N C E               ║
   ║   explain the code, read the posture  ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   model     {}
   detail    {}
   language  {}
   auth      {}
   detector  {}
   weights   {}
   output    {}

   type code to explain it, or /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.model,
        info.detail,
        info.language,
        info.auth_status,
        info.detector,
        info.models_dir.display(),
        info.output_dir.display(),
    )
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!("{}", banner_text(info));
}

/// Session summary text: token usage (if any) and farewell.
pub fn session_summary(usage: TokenUsage) -> String {
    let mut out = String::new();
    if usage.total() > 0 {
        out.push_str(&format!(
            "session: {:>6} input + {:>6} output = {:>6} tokens\n",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        ));
    }
    out.push_str("goodbye.");
    out
}

/// Print the session summary (token usage + farewell).
pub fn print_session_summary(usage: TokenUsage) {
    println!("{}", session_summary(usage));
}
