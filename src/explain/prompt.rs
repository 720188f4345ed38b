//! Fixed prompt templates, one per [`DetailLevel`].

use super::{DetailLevel, ExplainError};
use crate::consts::MAX_CODE_BYTES;

const BASIC_INTRO: &str = "I need a simple and brief explanation of the following code:";
const BASIC_ASK: &str = "Please provide:
1. What the code does overall (1-2 sentences)
2. The main functions or components (brief list)
3. Any potential issues to be aware of

Keep the explanation concise and beginner-friendly.";

const MEDIUM_INTRO: &str = "Please explain the following code in a detailed but accessible way:";
const MEDIUM_ASK: &str = "Include:
1. Overall purpose and functionality
2. Explanation of each major component or function
3. The flow of execution
4. Any notable patterns or techniques used
5. Potential edge cases or limitations";

const DETAILED_INTRO: &str = "I need a comprehensive and in-depth analysis of this code:";
const DETAILED_ASK: &str = "Please provide:
1. Detailed purpose and context of the code
2. Line-by-line or block-by-block explanation where appropriate
3. Thorough analysis of the logic and algorithms used
4. Evaluation of error handling and edge cases
5. Potential optimization opportunities
6. Best practices followed or missed
7. Suggestions for improvement or alternative approaches";

/// Build the prompt for `code` at the given detail level.
///
/// The code is interpolated verbatim. Blank input and input over
/// [`MAX_CODE_BYTES`] are rejected before anything leaves the machine.
pub fn build_prompt(code: &str, detail: DetailLevel) -> Result<String, ExplainError> {
    if code.trim().is_empty() {
        return Err(ExplainError::EmptyInput);
    }
    if code.len() > MAX_CODE_BYTES {
        return Err(ExplainError::TooLarge(code.len(), MAX_CODE_BYTES));
    }

    let (intro, ask) = match detail {
        DetailLevel::Basic => (BASIC_INTRO, BASIC_ASK),
        DetailLevel::Medium => (MEDIUM_INTRO, MEDIUM_ASK),
        DetailLevel::Detailed => (DETAILED_INTRO, DETAILED_ASK),
    };

    Ok(format!("{intro}\n```\n{code}\n```\n{ask}"))
}
