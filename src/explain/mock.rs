use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ExplainError, Explainer, Explanation, TextModel};

/// A scripted explainer for tests. Returns pre-defined results in order
/// and records every prompt it receives.
pub struct MockExplainer {
    results: Mutex<Vec<Option<Result<Explanation, ExplainError>>>>,
    index: AtomicUsize,
    calls: Mutex<Vec<(TextModel, String)>>,
}

impl MockExplainer {
    pub fn new(results: Vec<Result<Explanation, ExplainError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().map(Some).collect()),
            index: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An explainer that always answers with `text`, once.
    pub fn answering(text: &str) -> Self {
        Self::new(vec![Ok(Explanation {
            text: text.to_string(),
            usage: None,
        })])
    }

    /// `(model, prompt)` pairs seen so far.
    pub fn calls(&self) -> Vec<(TextModel, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Explainer for MockExplainer {
    async fn explain(&self, model: TextModel, prompt: &str) -> Result<Explanation, ExplainError> {
        self.calls.lock().unwrap().push((model, prompt.to_string()));
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let mut results = self.results.lock().unwrap();
        results
            .get_mut(i)
            .and_then(Option::take)
            .unwrap_or_else(|| {
                Err(ExplainError::MalformedResponse(format!(
                    "MockExplainer: no more results (called {} times)",
                    i + 1
                )))
            })
    }
}
