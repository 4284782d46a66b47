use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogRecord, Constraints, PickSuggestion, Suggestion};

mod gemini;
pub mod parse;
pub mod prompts;

pub use gemini::GeminiClient;

/// Text-generating source of candidate titles. Output is untrusted; every
/// implementation must hand back fully validated values or fail.
#[async_trait]
pub trait SuggestionApi: Send + Sync {
    async fn generate_suggestions(
        &self,
        constraints: &Constraints,
        count: usize,
    ) -> Result<Vec<Suggestion>>;

    async fn generate_final_pick(
        &self,
        liked: &[CatalogRecord],
        disliked: &[CatalogRecord],
        excluded_titles: &[String],
    ) -> Result<PickSuggestion>;
}
