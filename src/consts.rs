//! Project-wide constants.

use std::path::PathBuf;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Credential key and environment variable for the chat-completion provider.
pub const PROVIDER: &str = "groq";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// OpenAI-compatible Groq endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Decoding parameters for every explanation request.
pub const TEMPERATURE: f32 = 0.1;
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Largest code snippet accepted for explanation, in bytes.
pub const MAX_CODE_BYTES: usize = 48 * 1024;

/// Largest image accepted for detection, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Minimum detector score for a box to be reported.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

/// Default directory holding `yolov1x/best.onnx` weight files.
pub const DEFAULT_MODELS_DIR: &str = "models";

/// Default database path: `~/.glance/glance.db`.
/// Holds stored credentials only.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".glance")
        .join("glance.db")
}

/// Default directory for annotated detection images.
pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("glance-out")
}

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Render a score in `[0, 1]` as a percentage with two decimals (0.8734 → `87.34%`).
pub fn format_percent(score: f32) -> String {
    let pct = (f64::from(score) * 100.0 * 100.0).round() / 100.0;
    format!("{pct:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consts_from_cargo_toml() {
        assert!(AUTHOR.contains("Assaf Sapir"));
        assert!(HOMEPAGE.contains("sapir.io"));
        assert!(REPO.contains("github.com/assapir/glance"));
    }

    #[test]
    fn decoding_parameters() {
        assert_eq!(TEMPERATURE, 0.1);
        assert_eq!(MAX_OUTPUT_TOKENS, 4096);
        assert_eq!(CONFIDENCE_THRESHOLD, 0.30);
    }

    #[test]
    fn format_number_small() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn format_number_thousands() {
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(123_456), "123,456");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn format_percent_two_decimals() {
        assert_eq!(format_percent(0.8734), "87.34%");
        assert_eq!(format_percent(0.5021), "50.21%");
    }

    #[test]
    fn format_percent_pads_trailing_zeros() {
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(format_percent(1.0), "100.00%");
        assert_eq!(format_percent(0.0), "0.00%");
    }

    #[test]
    fn format_percent_rounds() {
        assert_eq!(format_percent(0.87346), "87.35%");
        assert_eq!(format_percent(0.99999), "100.00%");
    }
}
