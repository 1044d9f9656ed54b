use crate::error::Result;

/// Caller-supplied token counting interface.
///
/// The engine assumes nothing about the tokenization algorithm beyond a
/// deterministic, non-negative count for a given string. Failures propagate
/// to the caller; the engine performs no retries.
pub trait TokenCounter {
    /// Count tokens in a text string
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Cheap character-based token estimator (~4 chars per token for code).
///
/// Useful for tests and rough budgeting; real deployments pass their own
/// model tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl TokenCounter for HeuristicTokenizer {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok((text.len() / 4).max(1))
    }
}
