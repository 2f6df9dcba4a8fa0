//! Relevance Evaluator
//! Decides whether retrieved items share enough vocabulary with the question
//! to be worth injecting into the prompt. Vector search always returns a
//! nearest neighbour, even for unrelated questions.

use tracing::debug;

pub struct RelevanceEvaluator;

impl RelevanceEvaluator {
    /// True iff at least one whitespace-separated question token occurs
    /// (case-insensitive substring) in at least one rendered item
    pub fn is_relevant<S: AsRef<str>>(question: &str, items: &[S]) -> bool {
        let items_lower: Vec<String> = items
            .iter()
            .map(|item| item.as_ref().to_lowercase())
            .collect();

        for token in question.split_whitespace() {
            let token = token.to_lowercase();
            if let Some(idx) = items_lower.iter().position(|item| item.contains(&token)) {
                debug!("Relevant: token '{}' found in retrieved item {}", token, idx);
                return true;
            }
        }

        debug!("No question token found in {} retrieved items", items.len());
        false
    }
}
