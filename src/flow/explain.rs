use tracing::{info, warn};

use crate::explain::prompt::build_prompt;
use crate::explain::{ExplainError, Explainer, Explanation, ExplanationRequest};
use crate::view::{ExplainView, Notice};

/// Explain the request's code and describe the outcome.
pub async fn run(explainer: &dyn Explainer, request: &ExplanationRequest) -> ExplainView {
    let mut view = ExplainView {
        model: Some(request.model),
        language: Some(request.language),
        ..ExplainView::default()
    };

    match explain(explainer, request).await {
        Ok(explanation) => {
            view.explanation = Some(explanation.text);
            view.usage = explanation.usage;
        }
        Err(ExplainError::EmptyInput) => {
            view.notices.push(Notice::Warning(
                "Please load a file or paste some code first.".to_string(),
            ));
        }
        Err(e) => {
            warn!(error = %e, "explanation failed");
            let credential = e.is_credential();
            view.notices.push(Notice::Error(e.to_string()));
            if credential {
                view.notices.push(Notice::Warning(
                    "Please provide a valid Groq API key: run /login or set GROQ_API_KEY."
                        .to_string(),
                ));
            }
        }
    }
    view
}

async fn explain(
    explainer: &dyn Explainer,
    request: &ExplanationRequest,
) -> Result<Explanation, ExplainError> {
    let prompt = build_prompt(&request.code, request.detail)?;
    info!(
        model = request.model.label(),
        detail = request.detail.label(),
        language = request.language.display_name(),
        code_bytes = request.code.len(),
        "explaining code"
    );
    explainer.explain(request.model, &prompt).await
}
