//! Generator adapter: free-text decision -> 2-6 short alternatives.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::client::CompletionProvider;

/// Minimum usable alternatives per decision.
pub const MIN_ALTERNATIVES: usize = 2;
/// Maximum alternatives per decision.
pub const MAX_ALTERNATIVES: usize = 6;

/// How many alternatives the provider is asked for.
const TARGET_ALTERNATIVES: usize = 4;

/// Served when the provider fails or returns nothing usable. Deliberately
/// domain-neutral so any decision text still gets a workable roll.
const FALLBACK_ALTERNATIVES: [&str; 4] = [
    "Go with your first instinct",
    "Take the opposite path and see",
    "Sleep on it for one more day",
    "Ask someone you trust before committing",
];

/// Generator errors visible to callers.
///
/// Provider failures are not represented here: the adapter absorbs them into
/// the fallback list.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("decision text must not be empty")]
    EmptyText,
}

/// Turns a decision's free-text description into candidate alternatives.
#[derive(Clone)]
pub struct GeneratorAdapter {
    provider: Arc<dyn CompletionProvider>,
}

impl GeneratorAdapter {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Generate 2-6 non-empty alternatives for the given decision text.
    ///
    /// Rejects empty/whitespace-only text before any provider call. Never
    /// fails on provider trouble: a degraded provider yields the fixed
    /// fallback list so a decision is always creatable once quota passes.
    pub async fn generate(&self, text: &str) -> Result<Vec<String>, GeneratorError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GeneratorError::EmptyText);
        }

        let prompt = build_prompt(text);
        match self.provider.complete(&prompt).await {
            Ok(completion) => {
                let alternatives = parse_alternatives(&completion);
                if alternatives.len() >= MIN_ALTERNATIVES {
                    debug!(count = alternatives.len(), "Alternatives generated");
                    Ok(alternatives)
                } else {
                    warn!(
                        parsed = alternatives.len(),
                        "Provider completion had too few usable lines, serving fallback"
                    );
                    Ok(fallback())
                }
            }
            Err(err) => {
                warn!(error = %err, "Alternative provider degraded, serving fallback");
                Ok(fallback())
            }
        }
    }
}

/// Instruction prompt for the provider.
fn build_prompt(decision_text: &str) -> String {
    format!(
        "You are a decision assistant. A user cannot make up their mind about \
         the situation below. Produce exactly {TARGET_ALTERNATIVES} practical, \
         distinct alternatives they could act on.\n\
         Rules:\n\
         - each alternative on its own line\n\
         - at most 15 words per alternative\n\
         - no numbering, no bullets, no extra commentary\n\n\
         Situation: {decision_text}"
    )
}

/// Extract alternative lines from a raw completion.
///
/// Strips list numbering and bullet prefixes, drops blanks and fragments of
/// three characters or fewer, and caps the result at [`MAX_ALTERNATIVES`].
fn parse_alternatives(completion: &str) -> Vec<String> {
    completion
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| {
                    c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '\u{2022}' | ' ')
                })
                .trim()
        })
        .filter(|line| line.len() > 3)
        .map(str::to_string)
        .take(MAX_ALTERNATIVES)
        .collect()
}

fn fallback() -> Vec<String> {
    FALLBACK_ALTERNATIVES.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::generator::client::ProviderError;
    use async_trait::async_trait;

    /// Provider stub returning a canned completion.
    struct FixedProvider(&'static str);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    /// Provider stub that always fails.
    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Empty)
        }
    }

    fn adapter(provider: impl CompletionProvider + 'static) -> GeneratorAdapter {
        GeneratorAdapter::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn empty_text_rejected_before_provider() {
        let generator = adapter(FailingProvider);
        assert!(matches!(generator.generate("").await, Err(GeneratorError::EmptyText)));
        assert!(matches!(generator.generate("   \n\t").await, Err(GeneratorError::EmptyText)));
    }

    #[tokio::test]
    async fn clean_completion_parsed_in_order() {
        let generator = adapter(FixedProvider(
            "Take the job offer\nStay and negotiate a raise\nFreelance for six months",
        ));
        let alternatives = generator.generate("Should I switch jobs?").await.unwrap();
        assert_eq!(
            alternatives,
            vec![
                "Take the job offer",
                "Stay and negotiate a raise",
                "Freelance for six months"
            ]
        );
    }

    #[tokio::test]
    async fn numbering_and_bullets_stripped() {
        let generator = adapter(FixedProvider(
            "1. First option here\n2) Second option here\n- Third option here\n* Fourth option here",
        ));
        let alternatives = generator.generate("what now").await.unwrap();
        assert_eq!(
            alternatives,
            vec![
                "First option here",
                "Second option here",
                "Third option here",
                "Fourth option here"
            ]
        );
    }

    #[tokio::test]
    async fn long_completion_capped_at_max() {
        let lines: Vec<String> = (0..10).map(|i| format!("Alternative number {i}")).collect();
        let completion: &'static str = Box::leak(lines.join("\n").into_boxed_str());
        let generator = adapter(FixedProvider(completion));

        let alternatives = generator.generate("too many options").await.unwrap();
        assert_eq!(alternatives.len(), MAX_ALTERNATIVES);
    }

    #[tokio::test]
    async fn failing_provider_serves_fallback() {
        let generator = adapter(FailingProvider);
        let alternatives = generator.generate("Should I go hiking?").await.unwrap();
        assert_eq!(alternatives.len(), 4);
        assert!(alternatives.iter().all(|a| !a.trim().is_empty()));
    }

    #[tokio::test]
    async fn unusable_completion_serves_fallback() {
        // Blank lines and short fragments only: below the minimum of 2.
        let generator = adapter(FixedProvider("ok\n\n- \n42"));
        let alternatives = generator.generate("hmm what").await.unwrap();
        assert_eq!(alternatives.len(), 4);
        assert_eq!(alternatives[0], FALLBACK_ALTERNATIVES[0]);
    }
}
